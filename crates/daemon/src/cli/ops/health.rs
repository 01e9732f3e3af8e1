use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::http_server::api::client::ApiError;
use codepad_daemon::http_server::health::liveness::LivezRequest;
use codepad_daemon::http_server::health::readiness::{ReadyzRequest, ReadyzResponse};
use codepad_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug)]
pub struct ConfigInfo {
    pub directory: PathBuf,
    pub workspace: PathBuf,
    pub api_port: u16,
}

#[derive(Debug)]
pub enum EndpointStatus {
    Ok,
    Unhealthy(String),
    NotReachable,
}

impl EndpointStatus {
    fn from_error(err: &ApiError) -> Self {
        match err {
            ApiError::HttpStatus(status, _) => EndpointStatus::Unhealthy(status.to_string()),
            _ => EndpointStatus::NotReachable,
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointStatus::Ok => write!(f, "{}", "OK".green()),
            EndpointStatus::Unhealthy(code) => write!(f, "{} ({})", "UNHEALTHY".red(), code),
            EndpointStatus::NotReachable => write!(f, "{}", "NOT REACHABLE".red()),
        }
    }
}

#[derive(Debug)]
pub struct DaemonInfo {
    pub url: String,
    pub livez: EndpointStatus,
    pub readyz: EndpointStatus,
    pub detail: Option<ReadyzResponse>,
}

#[derive(Debug)]
pub struct HealthOutput {
    pub config: Option<ConfigInfo>,
    pub config_error: Option<String>,
    pub daemon: DaemonInfo,
}

impl fmt::Display for HealthOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", "Config".bold())?;
        match &self.config {
            Some(info) => {
                writeln!(f, "  {} {}", "directory:".dimmed(), info.directory.display())?;
                writeln!(f, "  {} {}", "workspace:".dimmed(), info.workspace.display())?;
                writeln!(f, "  {} {}", "api_port:".dimmed(), info.api_port)?;
            }
            None => {
                if let Some(err) = &self.config_error {
                    writeln!(f, "  {} {}", "error:".red(), err)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{} ({}):", "Daemon".bold(), self.daemon.url)?;
        writeln!(f, "  {} {}", "livez:".dimmed(), self.daemon.livez)?;
        write!(f, "  {} {}", "readyz:".dimmed(), self.daemon.readyz)?;

        if let Some(detail) = &self.daemon.detail {
            writeln!(f)?;
            writeln!(f, "  {} {}", "database:".dimmed(), yes_no(detail.database))?;
            writeln!(f, "  {} {}", "workspace:".dimmed(), yes_no(detail.workspace))?;
            write!(f, "  {} {}", "terminals:".dimmed(), detail.active_terminals)?;
        }
        Ok(())
    }
}

fn yes_no(ok: bool) -> String {
    if ok {
        "OK".green().to_string()
    } else {
        "DOWN".red().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = HealthOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (config, config_error) = match AppState::load(ctx.config_path.clone()) {
            Ok(state) => (
                Some(ConfigInfo {
                    workspace: state.workspace_root(),
                    directory: state.codepad_dir,
                    api_port: state.config.api_port,
                }),
                None,
            ),
            Err(e) => (None, Some(e.to_string())),
        };

        let mut client = ctx.client.clone();
        let livez = match client.call(LivezRequest {}).await {
            Ok(_) => EndpointStatus::Ok,
            Err(e) => EndpointStatus::from_error(&e),
        };
        let (readyz, detail) = match client.call(ReadyzRequest {}).await {
            Ok(detail) => (EndpointStatus::Ok, Some(detail)),
            Err(e) => (EndpointStatus::from_error(&e), None),
        };

        Ok(HealthOutput {
            config,
            config_error,
            daemon: DaemonInfo {
                url: ctx.client.base_url().to_string(),
                livez,
                readyz,
                detail,
            },
        })
    }
}
