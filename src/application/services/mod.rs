//! Background services

pub mod activation_janitor;

pub use activation_janitor::{ActivationJanitor, JanitorConfig};
