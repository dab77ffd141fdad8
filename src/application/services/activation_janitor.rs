//! Non-activated account janitor
//!
//! Periodically deletes accounts whose owners never followed the activation
//! link within the retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::identity::AccountService;
use crate::config::AccountsConfig;
use crate::shared::shutdown::ShutdownSignal;
use crate::shared::DomainResult;

/// Upper bound on the retention window; larger values keep accounts forever anyway
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// How often to look for stale accounts (in seconds)
    pub check_interval_secs: u64,
    /// Age after which a non-activated account is removed (in days)
    pub retention_days: i64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 3600,
            retention_days: 3,
        }
    }
}

impl From<&AccountsConfig> for JanitorConfig {
    fn from(config: &AccountsConfig) -> Self {
        Self {
            check_interval_secs: config.janitor_interval_secs.max(1),
            retention_days: config
                .not_activated_retention_days
                .clamp(0, MAX_RETENTION_DAYS),
        }
    }
}

pub struct ActivationJanitor {
    accounts: Arc<AccountService>,
    config: JanitorConfig,
}

impl ActivationJanitor {
    pub fn new(accounts: Arc<AccountService>) -> Self {
        Self {
            accounts,
            config: JanitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: JanitorConfig) -> Self {
        self.config = config;
        self
    }

    /// One purge pass. Returns how many accounts were deleted.
    pub async fn run_once(&self) -> DomainResult<usize> {
        let days = self.config.retention_days.clamp(0, MAX_RETENTION_DAYS);
        let cutoff = Utc::now() - chrono::Duration::days(days);
        self.accounts.remove_not_activated_before(cutoff).await
    }

    /// Start the janitor background task
    pub fn start(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.config.check_interval_secs,
                retention_days = self.config.retention_days,
                "Activation janitor started"
            );

            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.check_interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_once().await {
                            warn!(error = %e, "Activation janitor pass failed");
                        }
                    }
                    _ = shutdown.wait() => {
                        info!("Activation janitor shutting down");
                        break;
                    }
                }
            }

            info!("Activation janitor stopped");
        })
    }
}
