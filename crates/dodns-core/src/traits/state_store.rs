// # State Store Trait
//
// Defines the interface for the last-known-IP cache.
//
// ## Purpose
//
// The cache holds the single address last propagated to DNS. It lets a
// scheduled run skip every provider call when the public IP is unchanged.
//
// ## Implementations
//
// - SQLite: single-table, single-column, single-row file (default)
// - File-based: JSON document with atomic writes
// - Memory: non-persistent, for tests
//
// ## Usage
//
// ```rust,ignore
// use dodns_core::StateStore;
// use std::net::Ipv4Addr;
//
// #[tokio::main]
// async fn main() -> dodns_core::Result<()> {
//     let store = /* StateStore implementation */;
//
//     store.ensure_schema().await?;
//     let last_ip = store.read().await?;
//
//     // After a successful DNS update
//     store.write(Ipv4Addr::new(1, 2, 3, 4)).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for state store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O on its own backing file
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
/// - ❌ Look up the public IP (owned by `IpSource`)
/// - ❌ Decide when to update (owned by `DdnsEngine`)
///
/// ## Invariants
///
/// - At most one value is stored at any time
/// - `write` never exposes an empty intermediate state to a later `read`
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Create the backing storage if it does not exist yet
    ///
    /// Must be idempotent and must not touch an existing value.
    async fn ensure_schema(&self) -> Result<(), crate::Error>;

    /// Read the cached IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Ipv4Addr))`: The last propagated IP
    /// - `Ok(None)`: Nothing cached yet
    /// - `Err(Error)`: Storage error
    async fn read(&self) -> Result<Option<Ipv4Addr>, crate::Error>;

    /// Replace the cached value with `ip`
    async fn write(&self, ip: Ipv4Addr) -> Result<(), crate::Error>;

    /// Short name for logging
    fn store_name(&self) -> &'static str;
}

/// Parse a stored value, treating garbage as "no prior value"
///
/// A value that does not parse forces the next run to re-propagate, which
/// rewrites the cache with a valid address.
pub(crate) fn parse_cached(raw: &str, store: &str) -> Option<Ipv4Addr> {
    match raw.trim().parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            tracing::warn!(
                "Ignoring unparseable cached IP {:?} in {} store",
                raw,
                store
            );
            None
        }
    }
}
