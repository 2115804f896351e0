//! Shared SQLite connection pool for the schema and database tools
//!
//! The pool is built on first use and rebuilt whenever the requested target
//! differs from the one the current pool was built for. All checkout and
//! statement work runs on the blocking thread pool.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub type DbPool = Pool<SqliteConnectionManager>;

const MEMORY_TARGET: &str = ":memory:";
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum SqlToolError {
    #[error("Invalid database url '{0}': only sqlite targets are supported")]
    InvalidUrl(String),

    #[error("Database file not found: {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Only read statements are allowed (set tools.allow_writes to permit writes)")]
    WriteRejected,

    #[error("Table not found: {0}")]
    NoSuchTable(String),

    #[error("Database task aborted: {0}")]
    Aborted(String),
}

/// Where a connection target points
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Memory,
    File(PathBuf),
}

impl Target {
    /// Accepts `sqlite://path`, `sqlite:path`, a plain path or `:memory:`
    fn parse(url: &str) -> Result<Self, SqlToolError> {
        let trimmed = url.trim();
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        if path.is_empty() || path.contains("://") {
            return Err(SqlToolError::InvalidUrl(url.to_string()));
        }
        if path == MEMORY_TARGET {
            Ok(Target::Memory)
        } else {
            Ok(Target::File(PathBuf::from(path)))
        }
    }

    fn build_pool(&self, pool_size: u32) -> Result<DbPool, SqlToolError> {
        let (manager, max_size) = match self {
            // every in-memory connection is its own database
            Target::Memory => (SqliteConnectionManager::memory(), 1),
            Target::File(path) => {
                if !path.exists() {
                    return Err(SqlToolError::MissingDatabase(path.clone()));
                }
                (SqliteConnectionManager::file(path), pool_size.max(1))
            }
        };
        Ok(Pool::builder()
            .max_size(max_size)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)?)
    }
}

pub struct ConnectionHandle {
    default_target: String,
    pool_size: u32,
    current: Mutex<Option<(String, DbPool)>>,
}

impl ConnectionHandle {
    pub fn new(default_target: impl Into<String>, pool_size: u32) -> Self {
        Self {
            default_target: default_target.into(),
            pool_size,
            current: Mutex::new(None),
        }
    }

    /// Pool for `target` (or the default), reusing the current one when the
    /// target string matches.
    pub fn pool(&self, target: Option<&str>) -> Result<DbPool, SqlToolError> {
        let target = target.unwrap_or(self.default_target.as_str());
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((built_for, pool)) = current.as_ref()
            && built_for == target
        {
            return Ok(pool.clone());
        }

        let pool = Target::parse(target)?.build_pool(self.pool_size)?;
        match current.as_ref() {
            Some((previous, _)) => info!(from = %previous, to = %target, "Rebuilt connection pool"),
            None => debug!(url = %target, "Built connection pool"),
        }
        *current = Some((target.to_string(), pool.clone()));
        Ok(pool)
    }

    /// Run `work` with a pooled connection on the blocking thread pool
    pub async fn with_connection<T, F>(
        self: &Arc<Self>,
        target: Option<String>,
        work: F,
    ) -> Result<T, SqlToolError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqlToolError> + Send + 'static,
    {
        let handle = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let pool = handle.pool(target.as_deref())?;
            let conn = pool.get()?;
            work(&conn)
        })
        .await
        .map_err(|e| SqlToolError::Aborted(e.to_string()))?
    }
}
