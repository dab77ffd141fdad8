//! # Account Service
//!
//! User-account management backend: administrators create, update, list and
//! delete accounts; new accounts get an activation email; logins and emails
//! are unique regardless of case.
//!
//! ## Architecture
//!
//! - **domain**: account model, authorities and repository traits
//! - **application**: account lifecycle, authentication, notifications and
//!   the activation janitor
//! - **infrastructure**: SeaORM storage, bcrypt/JWT, SMTP mail, in-memory storage
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{AccountService, AuthenticationService, NotificationService};
pub use infrastructure::{init_database, DatabaseConfig};
pub use interfaces::http::create_api_router;
pub use server::{init_tracing, ServerHandle, ServerOptions};
