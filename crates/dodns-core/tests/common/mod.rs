//! Test doubles and common utilities for contract tests
//!
//! The doubles count every call so tests can assert not only on outcomes
//! but on which remote operations happened at all.

#![allow(dead_code)]

use dodns_core::error::{Error, Result};
use dodns_core::traits::{DnsProvider, DnsRecord, DomainInfo, IpSource};
use dodns_core::UpdaterConfig;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource that returns a fixed address (or fails) and counts lookups
#[derive(Clone)]
pub struct FixedIpSource {
    ip: Option<Ipv4Addr>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every lookup times out
    pub fn failing() -> Self {
        Self {
            ip: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::ip_lookup("request timed out after 5s"))
    }

    fn source_name(&self) -> &str {
        "fixed"
    }
}

/// A remote write observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWrite {
    pub domain: String,
    pub record_id: u64,
    pub data: String,
}

/// An in-memory DNS provider with per-domain record fixtures
///
/// Writes are applied to the fixture, so a follow-up run sees the
/// rewritten records just like the real API would.
#[derive(Clone)]
pub struct MockDnsProvider {
    zones: Arc<Mutex<HashMap<String, Vec<DnsRecord>>>>,
    failing_domains: Arc<Mutex<HashSet<String>>>,
    resolve_calls: Arc<Mutex<Vec<String>>>,
    list_call_count: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<RecordWrite>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(HashMap::new())),
            failing_domains: Arc::new(Mutex::new(HashSet::new())),
            resolve_calls: Arc::new(Mutex::new(Vec::new())),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a domain with its records
    pub fn with_domain(self, domain: &str, records: Vec<DnsRecord>) -> Self {
        self.zones
            .lock()
            .unwrap()
            .insert(domain.to_string(), records);
        self
    }

    /// Make every API call for `domain` fail with an authentication error
    pub fn failing_on(self, domain: &str) -> Self {
        self.failing_domains
            .lock()
            .unwrap()
            .insert(domain.to_string());
        self
    }

    /// Domains passed to resolve_domain(), in call order
    pub fn resolved_domains(&self) -> Vec<String> {
        self.resolve_calls.lock().unwrap().clone()
    }

    /// Total number of provider calls of any kind
    pub fn total_calls(&self) -> usize {
        self.resolve_calls.lock().unwrap().len()
            + self.list_call_count.load(Ordering::SeqCst)
            + self.writes.lock().unwrap().len()
    }

    /// Every record write, in call order
    pub fn writes(&self) -> Vec<RecordWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Current records of a domain
    pub fn records(&self, domain: &str) -> Vec<DnsRecord> {
        self.zones
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    fn check_failure(&self, domain: &str) -> Result<()> {
        if self.failing_domains.lock().unwrap().contains(domain) {
            return Err(Error::auth(format!("401 Unauthorized for {}", domain)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_domain(&self, domain: &str) -> Result<DomainInfo> {
        self.resolve_calls.lock().unwrap().push(domain.to_string());
        self.check_failure(domain)?;

        if !self.zones.lock().unwrap().contains_key(domain) {
            return Err(Error::not_found(format!("Domain not found: {}", domain)));
        }

        Ok(DomainInfo {
            name: domain.to_string(),
            ttl: Some(1800),
        })
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure(domain)?;

        self.zones
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Domain not found: {}", domain)))
    }

    async fn update_record(&self, domain: &str, record: &DnsRecord, data: &str) -> Result<()> {
        self.check_failure(domain)?;

        let mut zones = self.zones.lock().unwrap();
        let stored = zones
            .get_mut(domain)
            .and_then(|records| records.iter_mut().find(|r| r.id == record.id))
            .ok_or_else(|| Error::not_found(format!("Record {} not found", record.id)))?;
        stored.data = data.to_string();

        self.writes.lock().unwrap().push(RecordWrite {
            domain: domain.to_string(),
            record_id: record.id,
            data: data.to_string(),
        });
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a record fixture
pub fn record(id: u64, record_type: &str, name: &str, data: &str) -> DnsRecord {
    DnsRecord {
        id,
        record_type: record_type.to_string(),
        name: name.to_string(),
        data: data.to_string(),
        ttl: Some(1800),
    }
}

/// A domain with the usual mix of records around a single apex A record
pub fn mixed_records(apex_ip: &str) -> Vec<DnsRecord> {
    vec![
        record(1, "A", "@", apex_ip),
        record(2, "A", "www", "9.9.9.9"),
        record(3, "AAAA", "@", "2001:db8::1"),
        record(4, "MX", "@", "mail.example.com"),
        record(5, "CNAME", "blog", "@"),
        record(6, "TXT", "@", "v=spf1 -all"),
    ]
}

/// Helper to create a minimal UpdaterConfig for testing
pub fn minimal_config(domains: &[&str]) -> UpdaterConfig {
    UpdaterConfig::new(
        domains.iter().map(|d| d.to_string()).collect(),
        "test-token",
    )
}
