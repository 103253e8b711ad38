// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Crash Behavior
//
// - The cached IP is lost when the process exits
// - Every run therefore treats the current IP as "new" and walks all domains
//
// ## When to Use
//
// - Tests
// - One-off manual runs where forcing a full sync is the point

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// Clones share the same cell, so a test can keep a handle and inspect
/// what the updater wrote.
///
/// # Example
///
/// ```rust,no_run
/// use dodns_core::state::MemoryStateStore;
/// use dodns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     store.write("1.2.3.4".parse()?).await?;
///     assert_eq!(store.read().await?, Some("1.2.3.4".parse()?));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<Ipv4Addr>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `ip`
    pub fn with_ip(ip: Ipv4Addr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip))),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn ensure_schema(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn read(&self) -> Result<Option<Ipv4Addr>, Error> {
        Ok(*self.inner.read().await)
    }

    async fn write(&self, ip: Ipv4Addr) -> Result<(), Error> {
        *self.inner.write().await = Some(ip);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
