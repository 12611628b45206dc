//! Pooled connection handle shared by the SQLite stores
//!
//! rusqlite is blocking, so every query runs on `spawn_blocking`. Writes
//! additionally take a per-handle async lock so that concurrent writers
//! queue in the runtime instead of spinning on `SQLITE_BUSY`.

use std::sync::Arc;

use application::error::ApplicationError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use rusqlite::types::Type;
use tokio::sync::Mutex;
use tokio::task;

use super::connection::ConnectionPool;
use super::error::{join_error, storage_error};

/// Pool plus write lock; cheap to clone
#[derive(Debug, Clone)]
pub struct StoreHandle {
    pool: Arc<ConnectionPool>,
    write_lock: Arc<Mutex<()>>,
}

impl StoreHandle {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run a read-only closure on a pooled connection
    pub async fn read<T, F>(&self, f: F) -> Result<T, ApplicationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(storage_error)?;
            f(&mut conn).map_err(storage_error)
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    /// Run a closure that modifies the database, holding the write lock
    pub async fn write<T, F>(&self, f: F) -> Result<T, ApplicationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        self.read(f).await
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order
pub fn to_db_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_db_time(column: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, Type::Text, e))
}

/// Wrap a domain parse failure as a row conversion error
pub fn conversion_error<E>(column: usize, ty: Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(e))
}
