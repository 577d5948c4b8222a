//! Wire models exchanged with the backend API.

pub mod blog;
pub mod errors;
pub mod identity;
pub mod product;
pub mod upload;

pub use blog::{Blog, BlogDraft, BlogPatch, LikeSummary};
pub use errors::ErrorBody;
pub use identity::{Identity, LoginRequest};
pub use product::{Product, ProductDraft, ProductImage, ProductPatch, ProductStatus};
pub use upload::ImageUpload;
