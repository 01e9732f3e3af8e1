use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

/// Everything needed to start the service, already resolved from
/// `config.toml`, flags and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_addr: SocketAddr,
    /// `None` keeps everything in memory for the life of the process
    pub database_url: Option<Url>,
    pub workspace_root: PathBuf,
    /// Shell for terminal sessions; the platform default when unset
    pub shell: Option<String>,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            api_addr: SocketAddr::from(([127, 0, 0, 1], crate::state::DEFAULT_API_PORT)),
            database_url: None,
            workspace_root: workspace_root.into(),
            shell: None,
            log_level: tracing::Level::INFO,
        }
    }
}
