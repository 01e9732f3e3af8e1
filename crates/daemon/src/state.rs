use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "codepad";
pub const DEFAULT_API_PORT: u16 = 5001;

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "db.sqlite";
const WORKSPACE_DIR_NAME: &str = "workspace";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine the home directory")]
    NoHomeDirectory,
    #[error("already initialized at {0}")]
    AlreadyInitialized(PathBuf),
    #[error("not initialized at {0}, run `codepad init` first")]
    NotInitialized(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    WriteConfig(#[from] toml::ser::Error),
    #[error("invalid database url {0}: {1}")]
    DatabaseUrl(String, url::ParseError),
}

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_port: u16,
    /// Mirror directory; `<codepad dir>/workspace` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    /// `<codepad dir>/db.sqlite` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            workspace_root: None,
            database_url: None,
            shell: None,
            log_level: "info".to_string(),
        }
    }
}

/// The on-disk home of a codepad install
#[derive(Debug, Clone)]
pub struct AppState {
    pub codepad_dir: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub workspace_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// `custom` if given, otherwise `~/.codepad`
    pub fn codepad_dir(custom: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{APP_NAME}")))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    fn layout(codepad_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: codepad_dir.join(CONFIG_FILE_NAME),
            db_path: codepad_dir.join(DB_FILE_NAME),
            workspace_path: codepad_dir.join(WORKSPACE_DIR_NAME),
            codepad_dir,
            config,
        }
    }

    /// Create the directory, config file, database file and workspace
    pub fn init(custom: Option<PathBuf>, config: Option<AppConfig>) -> Result<Self, StateError> {
        let codepad_dir = Self::codepad_dir(custom)?;
        let state = Self::layout(codepad_dir, config.unwrap_or_default());
        if state.config_path.exists() {
            return Err(StateError::AlreadyInitialized(state.codepad_dir));
        }

        fs::create_dir_all(&state.codepad_dir)?;
        fs::create_dir_all(state.workspace_root())?;
        if !state.db_path.exists() {
            fs::File::create(&state.db_path)?;
        }
        fs::write(&state.config_path, toml::to_string_pretty(&state.config)?)?;

        Ok(state)
    }

    pub fn load(custom: Option<PathBuf>) -> Result<Self, StateError> {
        let codepad_dir = Self::codepad_dir(custom)?;
        let config_path = codepad_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized(codepad_dir));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        Ok(Self::layout(codepad_dir, config))
    }

    pub fn workspace_root(&self) -> PathBuf {
        match &self.config.workspace_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => self.codepad_dir.join(root),
            None => self.workspace_path.clone(),
        }
    }

    pub fn database_url(&self) -> Result<Url, StateError> {
        let raw = match &self.config.database_url {
            Some(url) => url.clone(),
            None => sqlite_url(&self.db_path),
        };
        Url::parse(&raw).map_err(|e| StateError::DatabaseUrl(raw, e))
    }
}

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("codepad");

        let created = AppState::init(Some(home.clone()), None).unwrap();
        assert!(created.config_path.exists());
        assert!(created.db_path.exists());
        assert!(created.workspace_path.is_dir());

        let loaded = AppState::load(Some(home.clone())).unwrap();
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.workspace_root(), home.join("workspace"));
        assert_eq!(loaded.database_url().unwrap().scheme(), "sqlite");

        assert!(matches!(
            AppState::init(Some(home), None),
            Err(StateError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("api_port = 6000\nshell = \"zsh\"\n").unwrap();
        assert_eq!(config.api_port, 6000);
        assert_eq!(config.shell.as_deref(), Some("zsh"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.workspace_root, None);
    }
}
