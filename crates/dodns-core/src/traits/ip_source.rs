// # IP Source Trait
//
// Defines the interface for discovering the machine's public IPv4 address.
//
// ## Implementations
//
// - HTTP echo service: `dodns-ip-http` crate
// - Tests: scripted doubles in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use dodns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> dodns_core::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public address: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one outbound request per `current()` call
/// - ✅ Enforce a bounded timeout on that request
///
/// ## Forbidden Capabilities
/// - ❌ Retry or fall back to another endpoint (a failed lookup is fatal for the run)
/// - ❌ Access the state store
/// - ❌ Decide whether DNS needs updating (owned by `DdnsEngine`)
/// - ❌ Cache answers between calls
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address the outside world sees
    /// - `Err(Error)`: Timeout, non-2xx, network error or unparseable answer
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging
    fn source_name(&self) -> &str {
        "unknown"
    }
}
