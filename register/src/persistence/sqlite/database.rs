//! Connection handling for the register database.
//!
//! Every connection runs in WAL mode with foreign keys on, and waits up to
//! [`BUSY_TIMEOUT`] for the write lock instead of failing with
//! `database is locked`. Writes in the repositories are single statements
//! (or transactions whose first statement writes), so a waiting writer is
//! always covered by that timeout.

use std::path::Path;
#[cfg(test)]
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use super::admin_repo::seed_default_admin;
use crate::persistence::RegisterError;

/// How long a connection waits for another writer to finish.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_CONNECTIONS: u32 = 5;

/// Handle on the register database. Clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

fn tuned(options: SqliteConnectOptions) -> SqliteConnectOptions {
    options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
}

impl Database {
    /// Open the database file at `path`, creating it and its directory when
    /// missing, then apply migrations and the default admin seed.
    pub async fn open(path: &Path) -> Result<Self, RegisterError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Opening register database");

        let options = tuned(SqliteConnectOptions::new().filename(path)).create_if_missing(true);
        Self::connect(options, MAX_CONNECTIONS).await
    }

    /// In-memory database on a single connection, migrated and seeded.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, RegisterError> {
        let options = tuned(SqliteConnectOptions::from_str("sqlite::memory:")?);
        Self::connect(options, 1).await
    }

    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> Result<Self, RegisterError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), RegisterError> {
        self.run_migrations().await?;
        seed_default_admin(&self.pool).await?;
        Ok(())
    }

    /// Run embedded migrations from `register/migrations/`.
    async fn run_migrations(&self) -> Result<(), RegisterError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegisterError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection. Clones of this handle become unusable.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Register database closed");
    }
}
