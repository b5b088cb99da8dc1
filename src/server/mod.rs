//! Server orchestration for the gateway binary.
//!
//! This module exposes the command-line interface and the entry points that
//! keep the binary a thin wrapper around [`run`]. Configuration is resolved
//! once into [`Settings`], which both the HTTP daemon and the offline
//! subcommands consume.

pub mod admin;
pub mod cli;
pub mod http;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
pub use cli::{AppConfig, Cli, Commands, FileArgs, ResolvedCli, load_cli};
pub use http::{AppState, PublishedConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::ServiceLimits,
    engine::{EngineGateway, max_execution_time_from_secs},
};

/// Everything resolved from configuration before serving.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Active bounds and file limits.
    pub limits: ServiceLimits,
    /// Engine launcher.
    pub gateway: EngineGateway,
    /// Configured execution ceiling in seconds; zero means unbounded.
    pub max_execution_time_seconds: u64,
}

impl Settings {
    /// Resolve limits and build the engine gateway from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the limits override file is missing or invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let limits = ServiceLimits::load(config.limits.as_deref().map(Path::new))
            .map_err(|err| anyhow!("failed to load service limits: {err}"))?;
        let mut gateway = EngineGateway::new(&config.engine_program)
            .with_max_execution_time(max_execution_time_from_secs(config.max_execution_time_seconds));
        if !config.engine_script.is_empty() {
            gateway = gateway.with_leading_arg(&config.engine_script);
        }
        Ok(Self {
            limits,
            gateway,
            max_execution_time_seconds: config.max_execution_time_seconds,
        })
    }

    /// Limits as published to clients.
    #[must_use]
    pub const fn published(&self) -> PublishedConfig {
        PublishedConfig {
            limits: self.limits,
            max_execution_time_seconds: self.max_execution_time_seconds,
        }
    }

    /// Request state for the HTTP router.
    #[must_use]
    pub fn into_state(self) -> AppState { AppState::new(self.published(), Arc::new(self.gateway)) }
}

/// Parse CLI arguments and execute the requested command or daemon.
///
/// # Errors
///
/// Returns any error emitted while loading configuration or running the
/// requested command.
pub async fn run() -> Result<()> {
    init_tracing();
    let cli = load_cli()?;
    run_with_cli(cli).await
}

/// Execute the gateway using an already resolved [`ResolvedCli`].
///
/// # Errors
///
/// Returns any error raised while resolving settings, running a subcommand,
/// or serving HTTP.
pub async fn run_with_cli(cli: ResolvedCli) -> Result<()> {
    let ResolvedCli { config, command } = cli;
    let settings = Settings::from_config(&config)?;
    if let Some(command) = command {
        admin::run_command(command, &settings).await
    } else {
        run_daemon(&config.bind, settings).await
    }
}

/// Bind `bind` and serve the HTTP gateway until shutdown.
///
/// # Errors
///
/// Returns an error when the address cannot be bound or the server fails.
pub async fn run_daemon(bind: &str, settings: Settings) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(
        engine = ?settings.gateway,
        max_execution_time_seconds = settings.max_execution_time_seconds,
        "engine gateway configured"
    );
    http::serve(listener, settings.into_state()).await
}

/// Logs go to stderr so subcommand output on stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "stvd=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
