//! Identity: account lifecycle and authentication
//!
//! [`AccountService`] orchestrates account use-cases;
//! [`AuthenticationService`] exchanges credentials for a token.

pub mod auth;
pub mod bootstrap;
pub mod service;

pub use auth::{AuthenticationService, TokenResponse, BEARER};
pub use bootstrap::ensure_default_admin;
pub use service::AccountService;
