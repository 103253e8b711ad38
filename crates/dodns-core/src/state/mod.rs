// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

use crate::config::StateStoreConfig;
use crate::traits::StateStore;

/// Build the state store described by `config`
pub fn from_config(config: &StateStoreConfig) -> Box<dyn StateStore> {
    match config {
        StateStoreConfig::Sqlite { path } => Box::new(SqliteStateStore::new(path)),
        StateStoreConfig::File { path } => Box::new(FileStateStore::new(path)),
        StateStoreConfig::Memory => Box::new(MemoryStateStore::new()),
    }
}
