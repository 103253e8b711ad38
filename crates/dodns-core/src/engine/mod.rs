//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Reading the last propagated IP from the StateStore
//! - Looking up the current public IP via IpSource
//! - Rewriting the apex A record of every domain via DnsProvider
//! - Persisting the new IP once every domain succeeded
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  DdnsEngine  │
//!                    └──────────────┘
//!                           │
//!      ┌────────────────────┼────────────────────┐
//!      │                    │                    │
//!      ▼                    ▼                    ▼
//! ┌─────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ StateStore  │    │  IpSource   │    │ DnsProvider  │
//! │ (read/write)│    │  (lookup)   │    │ (list/update)│
//! └─────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Ensure the cache schema exists
//! 2. Read the cached IP (may be absent)
//! 3. Look up the current IP
//! 4. If absent or different: update every domain, then write the cache once
//! 5. Otherwise: nothing to do
//!
//! In dry-run mode step 4 lists records but writes neither DNS nor the
//! cache, so a later live run still sees the old cached IP.
//!
//! A failure at any step aborts the run. The cache is only written after
//! every domain succeeded, so the next scheduled run redoes the comparison
//! from scratch.

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource, StateStore};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// What a single domain pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// The domain that was processed
    pub domain: String,
    /// Number of apex A records found
    pub apex_records: usize,
    /// Number of apex A records rewritten
    pub updated: usize,
    /// Number of apex A records a dry run left stale
    pub would_update: usize,
}

/// Result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The cached IP matches the current one; no provider call was made
    Unchanged {
        /// The current (and cached) IP
        current_ip: Ipv4Addr,
    },

    /// Every domain was brought in line with the current IP and the cache
    /// now holds it
    Updated {
        /// The cached IP before the run, if any
        previous_ip: Option<Ipv4Addr>,
        /// The IP propagated to DNS
        new_ip: Ipv4Addr,
        /// Per-domain results, in configuration order
        reports: Vec<DomainReport>,
    },

    /// Dry run: records were inspected but not written, and the cache was
    /// left as it was
    DryRun {
        /// The cached IP, unchanged by the run
        previous_ip: Option<Ipv4Addr>,
        /// The IP a live run would propagate
        new_ip: Ipv4Addr,
        /// Per-domain results, in configuration order
        reports: Vec<DomainReport>,
    },
}

impl RunOutcome {
    /// Total number of remote record writes performed
    pub fn records_updated(&self) -> usize {
        match self {
            RunOutcome::Unchanged { .. } => 0,
            RunOutcome::Updated { reports, .. } | RunOutcome::DryRun { reports, .. } => {
                reports.iter().map(|r| r.updated).sum()
            }
        }
    }

    /// Number of record writes a dry run skipped
    pub fn records_pending(&self) -> usize {
        match self {
            RunOutcome::DryRun { reports, .. } => reports.iter().map(|r| r.would_update).sum(),
            _ => 0,
        }
    }
}

/// Core DDNS engine
///
/// One engine performs one run. It owns no state across runs other than
/// what the [`StateStore`] persists.
pub struct DdnsEngine {
    /// IP source for the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and rewriting records
    provider: Box<dyn DnsProvider>,

    /// Last-known-IP cache
    state_store: Box<dyn StateStore>,

    /// Domains to keep in sync
    domains: Vec<String>,

    /// Inspect only: no record writes, no cache write
    dry_run: bool,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `state_store`: State store implementation
    /// - `config`: Updater configuration (validated here)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            state_store,
            domains: config.domains,
            dry_run: config.provider.dry_run,
        })
    }

    /// Whether DNS must be updated given the cached and current IP
    pub fn needs_update(cached: Option<Ipv4Addr>, current: Ipv4Addr) -> bool {
        cached != Some(current)
    }

    /// Perform one full run
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome)`: The run completed (with or without updates)
    /// - `Err(Error)`: Lookup, provider or store failure; the cache was not written
    pub async fn run_once(&self) -> Result<RunOutcome> {
        self.state_store.ensure_schema().await?;

        let cached_ip = self.state_store.read().await?;
        debug!(
            "Cached IP ({} store): {}",
            self.state_store.store_name(),
            describe(cached_ip)
        );

        let current_ip = self.ip_source.current().await?;
        info!("Current public IP: {} (via {})", current_ip, self.ip_source.source_name());

        if !Self::needs_update(cached_ip, current_ip) {
            info!("IP unchanged since last run, nothing to do");
            return Ok(RunOutcome::Unchanged { current_ip });
        }

        info!(
            "IP changed: {} -> {}, updating {} domain(s)",
            describe(cached_ip),
            current_ip,
            self.domains.len()
        );

        let mut reports = Vec::with_capacity(self.domains.len());
        for domain in &self.domains {
            reports.push(self.update_domain(domain, current_ip).await?);
        }

        if self.dry_run {
            info!("[DRY-RUN] Cache left at {}", describe(cached_ip));
            return Ok(RunOutcome::DryRun {
                previous_ip: cached_ip,
                new_ip: current_ip,
                reports,
            });
        }

        self.state_store.write(current_ip).await?;
        info!("Cached new IP {}", current_ip);

        Ok(RunOutcome::Updated {
            previous_ip: cached_ip,
            new_ip: current_ip,
            reports,
        })
    }

    /// Bring the apex A record(s) of one domain in line with `ip`
    ///
    /// Records of any other type or name are never touched. Records that
    /// already hold `ip` are left alone.
    pub async fn update_domain(&self, domain: &str, ip: Ipv4Addr) -> Result<DomainReport> {
        let info = self.provider.resolve_domain(domain).await?;
        debug!("Resolved domain {} (ttl: {:?})", info.name, info.ttl);

        let records = self.provider.list_records(domain).await?;
        debug!("Domain {} has {} record(s)", domain, records.len());

        let new_data = ip.to_string();
        let mut report = DomainReport {
            domain: domain.to_string(),
            apex_records: 0,
            updated: 0,
            would_update: 0,
        };

        for record in records.iter().filter(|r| r.is_apex_a()) {
            report.apex_records += 1;

            if record.data == new_data {
                debug!("Apex record {} of {} already points at {}", record.id, domain, ip);
                continue;
            }

            if self.dry_run {
                info!(
                    "[DRY-RUN] Would update {} apex A record {}: {} -> {}",
                    domain, record.id, record.data, new_data
                );
                report.would_update += 1;
                continue;
            }

            self.provider.update_record(domain, record, &new_data).await?;
            info!(
                "Updated {} apex A record {}: {} -> {}",
                domain, record.id, record.data, new_data
            );
            report.updated += 1;
        }

        if report.apex_records == 0 {
            warn!(
                "Domain {} has no apex A record at {}; nothing to update",
                domain,
                self.provider.provider_name()
            );
        }

        Ok(report)
    }
}

fn describe(ip: Option<Ipv4Addr>) -> String {
    ip.map(|ip| ip.to_string()).unwrap_or_else(|| "none".to_string())
}
