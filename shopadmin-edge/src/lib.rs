//! Edge server for the ShopAdmin console.
//!
//! Serves the console pages and sends visitors without a session cookie from
//! the dashboard to the login page before any page renders. The check only
//! looks for the cookie; the backend still decides whether the session is
//! valid.

pub mod filter;
pub mod logging;
pub mod server;
mod tracer;

pub use filter::{EdgeFilter, FilterError, Verdict, enforce_session_cookie, normalize_path};
pub use server::{build_router, run};
