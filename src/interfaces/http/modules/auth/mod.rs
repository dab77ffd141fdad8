//! Auth module: login and account activation

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
