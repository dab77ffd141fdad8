//! Application layer: use-cases and the ports they depend on

pub mod identity;
pub mod notifications;
pub mod ports;
pub mod services;

pub use identity::{AccountService, AuthenticationService, TokenResponse};
pub use notifications::{DeliveryOutcome, NotificationService};
pub use services::{ActivationJanitor, JanitorConfig};
