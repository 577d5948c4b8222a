pub mod blogs;
pub mod completion;
pub mod config;
pub mod products;
pub mod session;
