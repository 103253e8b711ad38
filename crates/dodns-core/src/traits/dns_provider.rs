// # DNS Provider Trait
//
// Defines the interface for reading and rewriting DNS records via a
// provider API.
//
// ## Implementations
//
// - DigitalOcean: `dodns-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use dodns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> dodns_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.resolve_domain("example.com").await?;
//     for record in provider.list_records("example.com").await? {
//         if record.is_apex_a() {
//             provider.update_record("example.com", &record, "1.2.3.4").await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Record type the updater manages
pub const RECORD_TYPE_A: &str = "A";

/// Record name of the zone apex
pub const APEX_NAME: &str = "@";

/// A DNS record as reported by the provider
///
/// Records are external entities: the updater only ever rewrites the
/// `data` of records where [`DnsRecord::is_apex_a`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record ID
    pub id: u64,
    /// Record type ("A", "AAAA", "MX", ...)
    pub record_type: String,
    /// Record name relative to the domain ("@" for the apex)
    pub name: String,
    /// Record value
    pub data: String,
    /// Time-to-live, if the provider reports one
    pub ttl: Option<u32>,
}

impl DnsRecord {
    /// Whether this is the apex "A" record
    pub fn is_apex_a(&self) -> bool {
        self.record_type == RECORD_TYPE_A && self.name == APEX_NAME
    }
}

/// Domain metadata returned when a domain is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// Domain name as known by the provider
    pub name: String,
    /// Default TTL of the zone
    pub ttl: Option<u32>,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (a failed run is retried by the next scheduled run)
/// - ❌ Access the state store (owned by `DdnsEngine`)
/// - ❌ Decide which records need rewriting (owned by `DdnsEngine`)
/// - ❌ Cache state beyond a single request
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a domain through the provider API
    ///
    /// Fails with `Error::NotFound` if the account does not manage the domain.
    async fn resolve_domain(&self, domain: &str) -> Result<DomainInfo, crate::Error>;

    /// List every record of a domain
    ///
    /// Implementations must return all records, following pagination
    /// if the API paginates.
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Overwrite the value of one record
    ///
    /// # Parameters
    ///
    /// - `domain`: The domain the record belongs to
    /// - `record`: The record as returned by [`DnsProvider::list_records`]
    /// - `data`: The new record value
    async fn update_record(
        &self,
        domain: &str,
        record: &DnsRecord,
        data: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
