//! Outbound ports: interfaces the application layer calls out through
//!
//! [`MailSender`] decouples notification logic from the SMTP transport,
//! [`PasswordEncoder`] from the concrete one-way hash.

use async_trait::async_trait;

use crate::shared::{DomainResult, InfraError};

// ── Mail ───────────────────────────────────────────────────────

/// Plain-text email ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Port for delivering email.
///
/// Implementations report transport failures as errors; callers decide
/// whether those failures matter.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), InfraError>;

    /// `false` when the transport is a no-op (no SMTP host configured).
    fn is_enabled(&self) -> bool {
        true
    }
}

// ── Passwords ──────────────────────────────────────────────────

/// Port for one-way password hashing
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw: &str) -> DomainResult<String>;

    /// Returns `false` for a malformed hash instead of failing.
    fn matches(&self, raw: &str, hash: &str) -> bool;
}
