// # SQLite State Store
//
// SQLite implementation of StateStore. This is the default cache.
//
// ## Layout
//
// One table, one column, at most one row:
//
// ```sql
// CREATE TABLE IF NOT EXISTS last_ip (ip TEXT);
// ```
//
// Databases created by earlier releases declared the column without a type
// (`last_ip (ip)`); values are stored as text either way and read back the
// same.
//
// ## Atomicity
//
// `write` clears the table and inserts the new row inside one transaction,
// so a concurrent reader never observes an empty table.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::Error;
use crate::traits::state_store::{StateStore, parse_cached};

/// SQLite-backed last-known-IP cache
///
/// A connection is opened per operation on the blocking thread pool;
/// the store itself only holds the path.
#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    path: PathBuf,
}

impl SqliteStateStore {
    /// Create a store backed by the database file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path).map_err(|e| {
                Error::state_store(format!(
                    "Failed to open cache database {}: {}",
                    path.display(),
                    e
                ))
            })?;
            op(&mut conn)
        })
        .await
        .map_err(|e| Error::state_store(format!("Cache task failed: {}", e)))?
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn ensure_schema(&self) -> Result<(), Error> {
        self.with_connection(|conn| {
            conn.execute("CREATE TABLE IF NOT EXISTS last_ip (ip TEXT)", [])?;
            Ok(())
        })
        .await?;
        tracing::debug!("Cache schema ready at {}", self.path.display());
        Ok(())
    }

    async fn read(&self) -> Result<Option<Ipv4Addr>, Error> {
        let raw = self
            .with_connection(|conn| {
                let row = conn
                    .query_row("SELECT ip FROM last_ip LIMIT 1", [], |row| {
                        row.get::<_, Option<String>>(0)
                    })
                    .optional()?;
                Ok(row.flatten())
            })
            .await?;

        Ok(raw.and_then(|raw| parse_cached(&raw, self.store_name())))
    }

    async fn write(&self, ip: Ipv4Addr) -> Result<(), Error> {
        let value = ip.to_string();
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM last_ip", [])?;
            tx.execute("INSERT INTO last_ip (ip) VALUES (?1)", params![value])?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        tracing::debug!("Cached IP {} in {}", ip, self.path.display());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "sqlite"
    }
}
