//! Mail transport adapters
//!
//! [`SmtpMailer`] delivers through an async SMTP relay; [`LogMailer`] is the
//! no-op used when no SMTP host is configured.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::application::ports::{EmailMessage, MailSender};
use crate::config::MailConfig;
use crate::shared::InfraError;

/// SMTP transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, InfraError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| InfraError::Mail(format!("Invalid sender address: {}", e)))?;

        let builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }
        .map_err(|e| InfraError::Mail(format!("Failed to configure SMTP transport: {}", e)))?
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), InfraError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| InfraError::Mail(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(header::ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| InfraError::Mail(format!("Failed to build email message: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| InfraError::Mail(format!("Failed to send email: {}", e)))?;

        debug!(to = %message.to, subject = %message.subject, "Email handed to SMTP relay");
        Ok(())
    }
}

/// No-op transport: logs what would have been sent
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), InfraError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail transport disabled; skipping actual send"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Pick the transport for the configuration: SMTP when a host is set,
/// otherwise the logging no-op.
pub fn build_mail_sender(config: &MailConfig) -> Result<Arc<dyn MailSender>, InfraError> {
    if config.smtp_host.trim().is_empty() {
        warn!("SMTP host not configured; mail will only be logged");
        Ok(Arc::new(LogMailer))
    } else {
        info!(host = %config.smtp_host, port = config.smtp_port, "SMTP transport configured");
        Ok(Arc::new(SmtpMailer::new(config)?))
    }
}
