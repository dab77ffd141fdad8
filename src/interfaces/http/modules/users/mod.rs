//! Users module: account administration and public lookup

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
