//! HTTP REST API
//!
//! - `authorization`: route access table and the middleware enforcing it
//! - `middleware`: bearer token to caller identity
//! - `modules`: handlers and DTOs per feature
//! - `router`: API router with Swagger documentation

pub mod authorization;
pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiServices};
