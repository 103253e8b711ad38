// # dodns-core
//
// Core library for the DigitalOcean apex-record DDNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for looking up the public IPv4 address
// - **DnsProvider**: Trait for reading and rewriting DNS records via provider APIs
// - **StateStore**: Trait for the persisted last-known-IP cache
// - **DdnsEngine**: Single-shot orchestrator: read cache → look up IP → compare → update
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single-Shot**: Each process performs one run; scheduling is external (cron, timers)
// 3. **Fail Loud**: No retries; a failed run leaves the cache untouched for the next one
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, StateStore, DnsRecord, DomainInfo};
pub use engine::{DdnsEngine, DomainReport, RunOutcome};
pub use config::{UpdaterConfig, IpSourceConfig, ProviderConfig, StateStoreConfig};
pub use error::{Error, Result};
pub use state::{MemoryStateStore, FileStateStore, SqliteStateStore};
