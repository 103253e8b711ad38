//! Core traits for the updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Look up the public IPv4 address
//! - [`DnsProvider`]: Read and rewrite DNS records via provider APIs
//! - [`StateStore`]: Persist the last propagated IP

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, DomainInfo, APEX_NAME, RECORD_TYPE_A};
pub use state_store::StateStore;
