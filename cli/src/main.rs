//! Account service CLI server
//!
//! ```sh
//! # Run with default config (~/.config/account-service/config.toml)
//! account-service
//!
//! # Custom config path
//! account-service --config /etc/account-service/config.toml
//!
//! # Override listen port and database
//! account-service --port 9090 --database-url sqlite://./dev.db?mode=rwc
//!
//! # Validate config without starting
//! account-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use account_service::config::AppConfig;
use account_service::server::{init_tracing, ServerHandle, ServerOptions};

/// User-account management REST service.
#[derive(Parser, Debug)]
#[command(
    name = "account-service",
    version,
    about = "User account management service",
    long_about = "REST API for creating, updating, listing and deleting user accounts.\n\n\
                  Default config: ~/.config/account-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ACCOUNT_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the database URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip creating the default admin account.
    #[arg(long)]
    no_admin: bool,

    /// Do not install the Prometheus recorder or serve /metrics.
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(account_service::default_config_path);

    let loaded = AppConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // Tracing first so every following line is formatted
    init_tracing(&config.logging);
    match loaded {
        Ok(_) => info!("Configuration loaded from {}", config_path.display()),
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    if let Some(host) = cli.host {
        info!("CLI override: api_host = {}", host);
        config.server.api_host = host;
    }
    if let Some(port) = cli.port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }
    if let Some(url) = cli.database_url {
        info!("CLI override: database url");
        config.database.url = url;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", config.database.connection_url());
        println!(
            "   Mail        : {}",
            if config.mail.smtp_host.is_empty() {
                "disabled (log only)"
            } else {
                config.mail.smtp_host.as_str()
            }
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        create_default_admin: !cli.no_admin,
        enable_metrics: !cli.no_metrics,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
