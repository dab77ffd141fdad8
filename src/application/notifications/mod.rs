//! Best-effort account notifications
//!
//! Every send resolves to a [`DeliveryOutcome`]; transport failures are
//! logged and counted, never returned to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ports::{EmailMessage, MailSender};
use crate::domain::Account;

pub const ACTIVATION_SUBJECT: &str = "Account activation";
pub const PASSWORD_RESET_SUBJECT: &str = "Your new password";

/// Path (under the public base URL) that activates an account
pub const ACTIVATION_PATH: &str = "/api/v1/user/activation/";

/// Result of a notification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Transport disabled or nothing to send
    Skipped,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// Builds account emails and sends them fire-and-forget
pub struct NotificationService {
    mailer: Arc<dyn MailSender>,
    base_url: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn MailSender>, base_url: impl Into<String>) -> Self {
        Self {
            mailer,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Deliver one message. Never fails; the outcome is for observability only.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryOutcome {
        let outcome = if !self.mailer.is_enabled() {
            debug!(to, subject, "Mail transport disabled");
            // The no-op transport still logs the message
            if let Err(e) = self.mailer.send(&EmailMessage::new(to, subject, body)).await {
                debug!(to, subject, error = %e, "Disabled mail transport reported an error");
            }
            DeliveryOutcome::Skipped
        } else {
            match self.mailer.send(&EmailMessage::new(to, subject, body)).await {
                Ok(()) => {
                    info!(to, subject, "Sent email");
                    DeliveryOutcome::Sent
                }
                Err(e) => {
                    warn!(to, subject, error = %e, "Email could not be sent");
                    DeliveryOutcome::Failed(e.to_string())
                }
            }
        };

        metrics::counter!("notifications_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }

    pub fn activation_link(&self, activation_key: &str) -> String {
        format!("{}{}{}", self.base_url, ACTIVATION_PATH, activation_key)
    }

    pub async fn send_activation_email(&self, account: &Account) -> DeliveryOutcome {
        let Some(key) = account.activation_key.as_deref() else {
            debug!(login = %account.login, "No activation key; activation email skipped");
            return DeliveryOutcome::Skipped;
        };

        debug!(email = %account.email, "Sending activation email");
        let body = format!(
            "Dear {},\n\nYour account has been created. Please click on the link below to activate it:\n\n{}\n",
            account.login,
            self.activation_link(key)
        );
        self.send(&account.email, ACTIVATION_SUBJECT, &body).await
    }

    pub async fn send_password_email(&self, account: &Account, password: &str) -> DeliveryOutcome {
        debug!(email = %account.email, "Sending password reset email");
        let body = format!(
            "Dear {},\n\nYour password has been reset. Your new password is: {}\n",
            account.login, password
        );
        self.send(&account.email, PASSWORD_RESET_SUBJECT, &body).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Mail transports for tests: one that records, one that always fails.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::application::ports::{EmailMessage, MailSender};
    use crate::shared::InfraError;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    impl RecordingMailer {
        pub fn messages(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), InfraError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FailingMailer;

    #[async_trait]
    impl MailSender for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), InfraError> {
            Err(InfraError::Mail("connection refused".into()))
        }
    }
}
