// # HTTP IP Source
//
// This crate looks up the machine's public IPv4 address by asking an
// external echo service (by default `https://api.ipify.org`), which answers
// with the caller's address as plain text.
//
// ## Behavior
//
// - One GET per lookup, bounded by a timeout (5 seconds by default)
// - The body is trimmed and parsed as an IPv4 address
// - Timeout, non-2xx, network error, unparseable or IPv6 answer → `Error::IpLookup`
// - No retry and no fallback endpoint: the run fails and the next scheduled
//   run tries again

use dodns_core::config::IpSourceConfig;
use dodns_core::traits::IpSource;
use dodns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org")
    /// - `timeout`: Upper bound for the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from HTTP service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Looking up public IP via {} (timeout {:?})", self.url, self.timeout);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::ip_lookup(format!(
                    "Request to {} timed out after {:?}",
                    self.url, self.timeout
                ))
            } else {
                Error::ip_lookup(format!("Request to {} failed: {}", self.url, e))
            }
        })?;

        if !response.status().is_success() {
            return Err(Error::ip_lookup(format!(
                "{} answered with HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_lookup(format!("Failed to read response: {}", e)))?;

        parse_ipv4_answer(&body)
    }
}

/// Parse an echo-service body into an IPv4 address
///
/// A/apex records only hold IPv4, so an IPv6 answer is an error rather
/// than something to write into DNS.
fn parse_ipv4_answer(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();

    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::ip_lookup(format!(
            "Expected an IPv4 address, got: {}",
            ip
        ))),
        Err(_) => Err(Error::ip_lookup(format!("Invalid IP address: {:?}", text))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.fetch_ip().await
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}
