use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use codepad_daemon::state::{AppConfig, AppState, DEFAULT_API_PORT};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Directory the project is mirrored into (default: <codepad dir>/workspace)
    #[arg(long)]
    pub workspace_root: Option<PathBuf>,

    /// Shell for terminal sessions (default: $SHELL, or bash)
    #[arg(long)]
    pub shell: Option<String>,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug)]
pub struct InitOutput {
    pub codepad_dir: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub workspace_root: PathBuf,
    pub api_port: u16,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} codepad at {}",
            "Initialized".green().bold(),
            self.codepad_dir.display().to_string().bold()
        )?;
        writeln!(f, "  {} {}", "Config:".dimmed(), self.config_path.display())?;
        writeln!(f, "  {} {}", "Database:".dimmed(), self.db_path.display())?;
        writeln!(f, "  {} {}", "Workspace:".dimmed(), self.workspace_root.display())?;
        write!(f, "  {} {}", "API port:".dimmed(), self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] codepad_daemon::state::StateError),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| InitError::InvalidLogLevel(self.log_level.clone()))?;

        let config = AppConfig {
            api_port: self.api_port,
            workspace_root: self.workspace_root.clone(),
            database_url: None,
            shell: self.shell.clone(),
            log_level: self.log_level.clone(),
        };
        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(InitOutput {
            workspace_root: state.workspace_root(),
            codepad_dir: state.codepad_dir,
            config_path: state.config_path,
            db_path: state.db_path,
            api_port: state.config.api_port,
        })
    }
}
