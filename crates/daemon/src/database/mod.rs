use std::ops::Deref;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use url::Url;

mod entry_queries;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("invalid database url {0}: {1}")]
    InvalidUrl(Url, sqlx::Error),
    #[error("failed to connect to database: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Pooled SQLite handle. Query methods live in the `*_queries` modules.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url` and apply migrations.
    ///
    /// An in-memory url gets a single long-lived connection, since every new
    /// connection would otherwise see its own empty database.
    pub async fn connect(url: &Url) -> Result<Self, DatabaseSetupError> {
        let in_memory = url.as_str().contains(":memory:");
        let options = SqliteConnectOptions::from_str(url.as_str())
            .map_err(|e| DatabaseSetupError::InvalidUrl(url.clone(), e))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Connect)?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(%url, "database ready");

        Ok(Self { pool })
    }

    /// Cheap round trip used by readiness checks
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
