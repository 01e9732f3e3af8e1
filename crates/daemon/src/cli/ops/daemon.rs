use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;
use url::Url;

use codepad_daemon::state::{AppState, StateError};
use codepad_daemon::{init_tracing, start_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the configured API port
    #[arg(long, env = "CODEPAD_API_PORT")]
    pub api_port: Option<u16>,

    /// Address to bind the API server on
    #[arg(long, env = "CODEPAD_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Override the configured workspace directory
    #[arg(long, env = "CODEPAD_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// Override the configured database, e.g. `sqlite::memory:`
    #[arg(long, env = "CODEPAD_DATABASE_URL")]
    pub database_url: Option<Url>,

    /// Override the configured terminal shell
    #[arg(long, env = "CODEPAD_SHELL")]
    pub shell: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid log level in config: {0}")]
    InvalidLogLevel(String),
    #[error("daemon failed: {0}")]
    Service(anyhow::Error),
}

impl Daemon {
    fn service_config(&self, state: &AppState) -> Result<ServiceConfig, DaemonError> {
        let log_level = state
            .config
            .log_level
            .parse::<tracing::Level>()
            .map_err(|_| DaemonError::InvalidLogLevel(state.config.log_level.clone()))?;
        let database_url = match &self.database_url {
            Some(url) => url.clone(),
            None => state.database_url()?,
        };
        let port = self.api_port.unwrap_or(state.config.api_port);

        let mut config =
            ServiceConfig::new(self.workspace_root.clone().unwrap_or_else(|| state.workspace_root()));
        config.api_addr = SocketAddr::new(self.bind, port);
        config.database_url = Some(database_url);
        config.shell = self.shell.clone().or_else(|| state.config.shell.clone());
        config.log_level = log_level;
        Ok(config)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let config = self.service_config(&state)?;

        let _guard = init_tracing(config.log_level);
        tracing::debug!(config_dir = %state.codepad_dir.display(), "loaded app state");

        start_service(&config).await.map_err(DaemonError::Service)?;
        Ok("daemon stopped".to_string())
    }
}
