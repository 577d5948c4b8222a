//! Client-side core of the ShopAdmin console.
//!
//! * [`api::AdminClient`] issues credentialed requests against the backend
//!   and normalizes failures into [`error::ApiError`].
//! * [`session`] resolves "who am I" into an [`shared::models::Identity`] or
//!   [`session::Unauthenticated`].
//! * [`auth::AuthStore`] is the single writer of the authentication state.
//! * [`guard::RouteGuard`] decides whether a protected view may render.

pub mod api;
pub mod auth;
pub mod blogs;
pub mod error;
pub mod guard;
pub mod products;
pub mod session;

pub use api::AdminClient;
pub use auth::{AuthState, AuthStore, Navigation};
pub use error::{ApiError, Operation};
pub use guard::{GuardOutcome, RouteGuard, RouteKind};
pub use session::{LoginError, SessionBackend, Unauthenticated};
