//! Configuration types for the updater
//!
//! This module defines all configuration structures used throughout the
//! workspace. Values are filled in by the binary from environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default IP echo endpoint (returns the caller's IPv4 as plain text)
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org";

/// Timeout for the IP lookup request
pub const DEFAULT_IP_TIMEOUT_SECS: u64 = 5;

/// Default SQLite cache file, relative to the working directory
pub const DEFAULT_SQLITE_PATH: &str = "last_ip.db";

/// Default JSON cache file, relative to the working directory
pub const DEFAULT_FILE_PATH: &str = "last_ip.json";

/// Main updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Domains whose apex A record is kept in sync
    pub domains: Vec<String>,

    /// IP lookup configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Last-known-IP cache configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

impl UpdaterConfig {
    /// Create a configuration with default lookup and cache settings
    pub fn new(domains: Vec<String>, api_token: impl Into<String>) -> Self {
        Self {
            domains,
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::new(api_token),
            state_store: StateStoreConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        for domain in &self.domains {
            validate_domain_name(domain)?;
        }

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.state_store.validate()?;

        Ok(())
    }
}

/// Split a comma-separated domain list
///
/// Each item is trimmed and empty items are dropped, so `"a.com, ,b.com"`
/// yields exactly `["a.com", "b.com"]`. A single trailing dot of a fully
/// qualified name is removed (`"example.com."` → `"example.com"`).
/// Duplicates are kept.
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| {
            let s = s.trim();
            s.strip_suffix('.').unwrap_or(s).to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validate that a string is a plausible domain name
///
/// Basic RFC 1035 checks: total length, label length, ASCII letters, digits
/// and hyphens only. Names are expected without a trailing dot (see
/// [`parse_domain_list`]); `"example.com."` is rejected here.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// IP lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of the IP echo service
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP lookup URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP lookup timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_ip_timeout_secs() -> u64 {
    DEFAULT_IP_TIMEOUT_SECS
}

/// DigitalOcean provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Bearer token with write access to the domains
    #[serde(skip_serializing)]
    pub api_token: String,

    /// API base URL override (tests and proxies); `None` means the public API
    #[serde(default)]
    pub api_base: Option<String>,

    /// Perform all reads but skip record writes
    #[serde(default)]
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Create a live-mode configuration for the public API
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: None,
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("DigitalOcean API token cannot be empty"));
        }
        if let Some(base) = &self.api_base
            && !base.starts_with("https://")
            && !base.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                base
            )));
        }
        Ok(())
    }
}

// The token must never reach logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// State store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// SQLite file with a single `last_ip (ip)` table
    Sqlite {
        /// Path to the database file
        path: PathBuf,
    },

    /// JSON file with atomic writes
    File {
        /// Path to the state file
        path: PathBuf,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::Sqlite { path } | StateStoreConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(crate::Error::config("State store path cannot be empty"));
                }
                Ok(())
            }
            StateStoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StateStoreConfig::Sqlite { .. } => "sqlite",
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
        }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::Sqlite {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}
