//! Service runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: database init and migrations,
//! default admin bootstrap, the activation janitor, the REST API and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::identity::{ensure_default_admin, AccountService, AuthenticationService};
use crate::application::notifications::NotificationService;
use crate::application::services::{ActivationJanitor, JanitorConfig};
use crate::config::{AppConfig, LoggingConfig};
use crate::infrastructure::crypto::{BcryptPasswordEncoder, JwtConfig};
use crate::infrastructure::{
    build_mail_sender, init_database, DatabaseConfig, SeaOrmAccountRepository,
    SeaOrmAuthorityRepository,
};
use crate::interfaces::http::modules::metrics::install_recorder;
use crate::interfaces::http::router::{create_api_router, ApiServices};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::{AppError, InfraError};

/// JWT issuer claim
pub const TOKEN_ISSUER: &str = "account-service";

/// Options for starting the service.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Create the configured admin when the account store is empty (default: true).
    pub create_default_admin: bool,
    /// Install the Prometheus recorder and mount `GET /metrics` (default: true).
    pub enable_metrics: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            create_default_admin: true,
            enable_metrics: true,
        }
    }
}

/// Handle to a running service.
///
/// ```rust,no_run
/// use account_service::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub accounts: Arc<AccountService>,
    pub config: AppConfig,
    /// Address the REST API is bound to
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    janitor_task: JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let app_cfg = opts.config;

        info!("Starting account service...");

        let prometheus_handle = if opts.enable_metrics {
            Some(prometheus_handle())
        } else {
            None
        };

        // ── Database ───────────────────────────────────────────
        let db_config = DatabaseConfig::from(&app_cfg.database);
        let db = init_database(&db_config).await.map_err(InfraError::from)?;

        // ── Collaborators ──────────────────────────────────────
        let account_repository = Arc::new(SeaOrmAccountRepository::new(db.clone()));
        let authority_repository = Arc::new(SeaOrmAuthorityRepository::new(db.clone()));
        let encoder = Arc::new(BcryptPasswordEncoder::new(app_cfg.security.bcrypt_cost));
        let mailer = build_mail_sender(&app_cfg.mail)?;
        let notifications = Arc::new(NotificationService::new(mailer, &app_cfg.mail.base_url));

        let jwt_config = JwtConfig {
            secret: app_cfg.security.jwt_secret.clone(),
            expiration_hours: app_cfg.security.jwt_expiration_hours,
            issuer: TOKEN_ISSUER.to_string(),
        };
        info!(
            expiration_hours = jwt_config.expiration_hours,
            "JWT configured"
        );

        if opts.create_default_admin {
            if let Some(admin) =
                ensure_default_admin(account_repository.as_ref(), encoder.as_ref(), &app_cfg.admin)
                    .await?
            {
                info!(login = %admin.login, "Default admin created");
            }
        }

        // ── Services ───────────────────────────────────────────
        let accounts = Arc::new(AccountService::new(
            account_repository.clone(),
            authority_repository,
            encoder.clone(),
            notifications,
        ));
        let authentication = Arc::new(AuthenticationService::new(
            account_repository,
            encoder,
            jwt_config.clone(),
        ));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        let janitor_task = ActivationJanitor::new(accounts.clone())
            .with_config(JanitorConfig::from(&app_cfg.accounts))
            .start(shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(ApiServices {
            accounts: accounts.clone(),
            authentication,
            jwt_config,
            metrics: prometheus_handle,
        });

        let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            accounts,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
            janitor_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to stop once shutdown has been triggered,
    /// bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            janitor_task,
            ..
        } = self;

        let completed = shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = api_task.await {
                    error!("REST API server task panicked: {}", e);
                }
                if let Err(e) = janitor_task.await {
                    error!("Activation janitor task panicked: {}", e);
                }
            })
            .await;

        if !completed {
            warn!("Some tasks did not stop in time");
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }

        info!("Account service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down account service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can only be installed once per process; a restart
/// in the same process reuses it.
fn prometheus_handle() -> PrometheusHandle {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    PROM_HANDLE
        .get_or_init(|| {
            let handle = install_recorder();
            info!("Prometheus metrics recorder installed");
            handle
        })
        .clone()
}

/// Initialize tracing from the logging config. Call once at process startup.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
