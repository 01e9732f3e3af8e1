use std::sync::Arc;

use url::Url;

use crate::database::{Database, DatabaseSetupError};
use crate::project::Project;
use crate::service_config::Config;
use crate::terminal::{default_shell, PtySpawner, ShellSpawner, TerminalManager};
use crate::workspace::{Workspace, WorkspaceError};

const IN_MEMORY_DATABASE: &str = "sqlite::memory:";

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("database setup failed: {0}")]
    Database(#[from] DatabaseSetupError),
    #[error("workspace setup failed: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("invalid database url: {0}")]
    DatabaseUrl(#[from] url::ParseError),
}

/// Shared handles passed to every request handler
#[derive(Debug, Clone)]
pub struct State {
    database: Database,
    project: Project<Database>,
    terminal: TerminalManager,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        Self::with_spawner(config, Arc::new(PtySpawner)).await
    }

    /// Build state with a custom shell spawner
    pub async fn with_spawner(
        config: &Config,
        spawner: Arc<dyn ShellSpawner>,
    ) -> Result<Self, StateSetupError> {
        let database_url = match &config.database_url {
            Some(url) => url.clone(),
            None => {
                tracing::warn!("no database configured, entries will not persist");
                Url::parse(IN_MEMORY_DATABASE)?
            }
        };
        let database = Database::connect(&database_url).await?;
        let workspace = Workspace::open(&config.workspace_root).await?;
        let project = Project::new(database.clone(), workspace);

        let shell = config.shell.clone().unwrap_or_else(default_shell);
        let terminal = TerminalManager::new(shell, spawner, Arc::new(project.clone()));

        Ok(Self {
            database,
            project,
            terminal,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn project(&self) -> &Project<Database> {
        &self.project
    }

    pub fn terminal(&self) -> &TerminalManager {
        &self.terminal
    }
}
