//! Database connection management
//!
//! Provides SQLite connection pooling via r2d2. Every pooled connection is
//! opened with the same PRAGMAs.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

/// Database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// SQLite connection pool type alias
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Milliseconds a connection waits on a locked database
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Create a new connection pool and bring the schema up to date
pub fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, DatabaseError> {
    info!(path = %config.path, max_connections = config.max_connections, "Creating database connection pool");

    let manager = if config.path == ":memory:" {
        SqliteConnectionManager::memory()
    } else {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        SqliteConnectionManager::file(&config.path)
    };

    let manager = manager.with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
    });

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)?;

    if config.run_migrations {
        let conn = pool.get()?;
        crate::persistence::migrations::run_migrations(&conn)?;
    }

    debug!("Database connection pool created successfully");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
            run_migrations: true,
        }
    }

    #[test]
    fn create_in_memory_pool() {
        let pool = create_pool(&memory_config()).unwrap();
        assert!(pool.get().is_ok());
    }

    #[test]
    fn file_pool_uses_wal_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather.db");
        let config = DatabaseConfig {
            path: path.to_string_lossy().into_owned(),
            max_connections: 2,
            run_migrations: true,
        };

        let pool = create_pool(&config).unwrap();
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();

        assert!(path.exists());
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(timeout, i64::from(BUSY_TIMEOUT_MS));
    }

    #[test]
    fn skips_migrations_when_disabled() {
        let config = DatabaseConfig {
            run_migrations: false,
            ..memory_config()
        };
        let pool = create_pool(&config).unwrap();
        let version: i64 = pool
            .get()
            .unwrap()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 0);
    }
}
