//! securecheck-dash - Traffic stop dashboard
//!
//! Serves the web UI for browsing the traffic stop log, running canned
//! analytical queries, and adding new stops.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use securecheck_common::config::{default_config_path, TomlConfig};
use securecheck_common::db::init::init_database;
use securecheck_dash::db::Store;
use securecheck_dash::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::filter::Directive;

/// Command-line arguments for securecheck-dash
///
/// Each value overrides the corresponding config file key.
#[derive(Parser, Debug)]
#[command(name = "securecheck-dash")]
#[command(about = "SecureCheck traffic stop dashboard")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "SECURECHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SECURECHECK_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "SECURECHECK_BIND")]
    bind: Option<String>,

    /// MySQL host
    #[arg(long, env = "SECURECHECK_DB_HOST")]
    db_host: Option<String>,

    /// MySQL port
    #[arg(long, env = "SECURECHECK_DB_PORT")]
    db_port: Option<u16>,

    /// MySQL user
    #[arg(long, env = "SECURECHECK_DB_USER")]
    db_user: Option<String>,

    /// MySQL password
    #[arg(long, env = "SECURECHECK_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// MySQL database name
    #[arg(long, env = "SECURECHECK_DB_NAME")]
    db_name: Option<String>,

    /// Create the traffic_stops table if it is missing
    #[arg(long)]
    init_schema: bool,
}

impl Args {
    fn apply_to(self, config: &mut TomlConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(host) = self.db_host {
            config.store.host = host;
        }
        if let Some(port) = self.db_port {
            config.store.port = port;
        }
        if let Some(user) = self.db_user {
            config.store.user = user;
        }
        if let Some(password) = self.db_password {
            config.store.password = password;
        }
        if let Some(name) = self.db_name {
            config.store.database = name;
        }
        if self.init_schema {
            config.server.init_schema = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = TomlConfig::load(config_path.as_deref())?;

    // RUST_LOG overrides the configured level
    let default_directive: Directive = config
        .logging
        .level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy(),
        )
        .init();

    // Build identification first, before any store round trip
    info!(
        "Starting SecureCheck dashboard (securecheck-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config file found, using compiled defaults"),
    }

    args.apply_to(&mut config);
    config.validate()?;

    info!("Store: {}", config.store.display_target());

    if config.server.init_schema {
        init_database(&config.store.connect_options())
            .await
            .context("Failed to initialize traffic_stops schema")?;
    }

    let state = AppState::new(Store::new(&config.store));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("securecheck-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
