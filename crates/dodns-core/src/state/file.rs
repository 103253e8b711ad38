// # File State Store
//
// JSON-file implementation of StateStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename
// - Corruption detection: JSON validation on load
// - Automatic backup: keeps `.backup` of the last known good state
// - Recovery: falls back to the backup if the main file is corrupted
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "last_ip": "1.2.3.4",
//   "last_updated": "2025-01-09T12:00:00Z"
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::state_store::{StateStore, parse_cached};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    last_ip: Option<String>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

impl StateFileFormat {
    fn empty() -> Self {
        Self {
            version: STATE_FILE_VERSION.to_string(),
            last_ip: None,
            last_updated: None,
        }
    }
}

/// File-based state store with crash recovery
///
/// The path is fixed at construction; nothing is read until the first
/// [`StateStore::read`].
///
/// # Example
///
/// ```rust,no_run
/// use dodns_core::state::FileStateStore;
/// use dodns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/dodns/last_ip.json");
///     store.ensure_schema().await?;
///     store.write("1.2.3.4".parse()?).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timestamp of the last successful write, if any
    pub async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(self
            .load_state_with_recovery()
            .await?
            .and_then(|state| state.last_updated))
    }

    /// Load state from file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main state file
    /// 2. If JSON parse error, try loading backup
    /// 3. If backup also fails, start with empty state
    async fn load_state_with_recovery(&self) -> Result<Option<StateFileFormat>, Error> {
        match Self::load_state(&self.path).await {
            Ok(state) => Ok(state),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "State file {} appears corrupted: {}. Attempting recovery from backup.",
                    self.path.display(),
                    e
                );

                let backup_path = Self::backup_path(&self.path);
                match Self::load_state(&backup_path).await {
                    Ok(Some(state)) => {
                        tracing::info!("Recovered state from backup");
                        if let Err(restore_err) =
                            Self::restore_from_backup(&self.path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore state file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(Some(state))
                    }
                    Ok(None) => {
                        tracing::warn!("No backup file found. Starting with empty state.");
                        Ok(None)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unusable: {}. Starting with empty state.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load state from file, `None` if the file does not exist
    async fn load_state(path: &Path) -> Result<Option<StateFileFormat>, Error> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let state: StateFileFormat = serde_json::from_str(&content)?;

        if state.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STATE_FILE_VERSION,
                state.version
            );
        }

        Ok(Some(state))
    }

    /// Write state to file atomically
    async fn write_state(&self, state: &StateFileFormat) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous good state around
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore state file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn ensure_schema(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::debug!("Creating empty state file {}", self.path.display());
            self.write_state(&StateFileFormat::empty()).await?;
        }

        Ok(())
    }

    async fn read(&self) -> Result<Option<Ipv4Addr>, Error> {
        let state = self.load_state_with_recovery().await?;
        Ok(state
            .and_then(|s| s.last_ip)
            .and_then(|raw| parse_cached(&raw, self.store_name())))
    }

    async fn write(&self, ip: Ipv4Addr) -> Result<(), Error> {
        let state = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            last_ip: Some(ip.to_string()),
            last_updated: Some(Utc::now()),
        };
        self.write_state(&state).await
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path);
        store.ensure_schema().await.unwrap();
        assert!(path.exists());

        // Initially empty
        assert_eq!(store.read().await.unwrap(), None);

        let ip = Ipv4Addr::new(1, 2, 3, 4);
        store.write(ip).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(ip));
        assert!(store.last_updated().await.unwrap().is_some());

        // A fresh instance sees the persisted value
        let store2 = FileStateStore::new(&path);
        assert_eq!(store2.read().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStateStore::new(&path);
        store.ensure_schema().await.unwrap();

        let ip = Ipv4Addr::new(1, 2, 3, 4);
        store.write(ip).await.unwrap();

        // Must not wipe the existing value
        store.ensure_schema().await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path);
        let ip1 = Ipv4Addr::new(1, 2, 3, 4);
        store.write(ip1).await.unwrap();

        // Second write creates the backup
        let ip2 = Ipv4Addr::new(1, 2, 3, 5);
        store.write(ip2).await.unwrap();

        let backup_path = FileStateStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        // Backup holds the state before the last write
        let recovered = store.read().await.unwrap();
        assert_eq!(recovered, Some(ip1));

        // The main file was restored
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("1.2.3.4"));
    }

    #[tokio::test]
    async fn test_corruption_without_backup_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileStateStore::new(&path);
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_ip_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, br#"{"version": "1.0", "last_ip": "not-an-ip"}"#).unwrap();

        let store = FileStateStore::new(&path);
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_last_write_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path);
        for i in 0..10 {
            store.write(Ipv4Addr::new(1, 2, 3, i)).await.unwrap();
        }

        let store2 = FileStateStore::new(&path);
        assert_eq!(store2.read().await.unwrap(), Some(Ipv4Addr::new(1, 2, 3, 9)));
        assert!(!store.temp_path().exists());
    }
}
