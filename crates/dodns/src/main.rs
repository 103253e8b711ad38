// # dodns - DigitalOcean apex-record updater
//
// One invocation performs one run and exits; schedule it with cron or a
// systemd timer. This binary is a thin integration layer:
//
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Build the IP source, DNS provider and cache
// 4. Run the engine once and map the outcome to an exit code
//
// All update logic lives in dodns-core.
//
// ## Configuration
//
// - `do_dns_domains`: Comma-separated domains whose apex A record is managed (required)
// - `do_dns_token`: DigitalOcean API token (required)
// - `do_dns_cache_type`: `sqlite` (default) or `file`
// - `do_dns_cache_path`: Cache location (default `last_ip.db`, or `last_ip.json` for `file`)
// - `do_dns_ip_url`: IP echo service (default `https://api.ipify.org`)
// - `do_dns_mode`: `live` (default) or `dry-run`
// - `do_dns_log_level`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export do_dns_domains=example.com,example.org
// export do_dns_token=your_token
//
// dodns
// ```

use anyhow::{Context, Result};
use dodns_core::config::{
    DEFAULT_FILE_PATH, DEFAULT_SQLITE_PATH, IpSourceConfig, StateStoreConfig, UpdaterConfig,
    parse_domain_list,
};
use dodns_core::{DdnsEngine, RunOutcome};
use dodns_ip_http::HttpIpSource;
use dodns_provider_digitalocean::DigitalOceanProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const ENV_DOMAINS: &str = "do_dns_domains";
const ENV_TOKEN: &str = "do_dns_token";
const ENV_CACHE_TYPE: &str = "do_dns_cache_type";
const ENV_CACHE_PATH: &str = "do_dns_cache_path";
const ENV_IP_URL: &str = "do_dns_ip_url";
const ENV_MODE: &str = "do_dns_mode";
const ENV_LOG_LEVEL: &str = "do_dns_log_level";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Run completed, nothing to do, or required settings absent
/// - 1: Invalid configuration or startup error
/// - 2: Runtime error (IP lookup, provider, cache)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean exit
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Why settings could not be loaded
#[derive(Debug)]
enum SettingsError {
    /// A required variable is unset or blank; the tool has nothing to do
    Missing(&'static str),
    /// A variable is set to something unusable
    Invalid(anyhow::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Missing(name) => {
                write!(f, "{} is not set. Set it via: export {}=...", name, name)
            }
            SettingsError::Invalid(e) => write!(f, "{:#}", e),
        }
    }
}

/// Everything the binary needs, resolved from the environment
#[derive(Debug)]
struct Settings {
    config: UpdaterConfig,
    log_level: Level,
}

impl Settings {
    /// Load settings from the process environment
    fn from_env() -> std::result::Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, SettingsError> {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let domains = set(ENV_DOMAINS)
            .map(|raw| parse_domain_list(&raw))
            .filter(|domains| !domains.is_empty())
            .ok_or(SettingsError::Missing(ENV_DOMAINS))?;
        let token = set(ENV_TOKEN).ok_or(SettingsError::Missing(ENV_TOKEN))?;

        let mut config = UpdaterConfig::new(domains, token.trim());

        let cache_path = set(ENV_CACHE_PATH).map(PathBuf::from);
        config.state_store = match set(ENV_CACHE_TYPE).as_deref().map(str::trim) {
            None | Some("sqlite") => StateStoreConfig::Sqlite {
                path: cache_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            },
            Some("file") => StateStoreConfig::File {
                path: cache_path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_PATH)),
            },
            Some(other) => {
                return Err(SettingsError::Invalid(anyhow::anyhow!(
                    "{} '{}' is not supported. Supported types: sqlite, file",
                    ENV_CACHE_TYPE,
                    other
                )));
            }
        };

        if let Some(url) = set(ENV_IP_URL) {
            config.ip_source = IpSourceConfig {
                url: url.trim().to_string(),
                ..IpSourceConfig::default()
            };
        }

        config.provider.dry_run = match set(ENV_MODE).as_deref().map(str::trim) {
            None | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => {
                return Err(SettingsError::Invalid(anyhow::anyhow!(
                    "{} '{}' is not valid. Valid modes: live, dry-run",
                    ENV_MODE,
                    other
                )));
            }
        };

        let log_level = match set(ENV_LOG_LEVEL)
            .map(|l| l.trim().to_lowercase())
            .as_deref()
        {
            Some("trace") => Level::TRACE,
            Some("debug") => Level::DEBUG,
            None | Some("info") => Level::INFO,
            Some("warn") => Level::WARN,
            Some("error") => Level::ERROR,
            Some(other) => {
                return Err(SettingsError::Invalid(anyhow::anyhow!(
                    "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                    ENV_LOG_LEVEL,
                    other
                )));
            }
        };

        config
            .validate()
            .map_err(|e| SettingsError::Invalid(anyhow::Error::new(e)))?;

        Ok(Self { config, log_level })
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e @ SettingsError::Missing(_)) => {
            eprintln!("Nothing to do: {}", e);
            return DdnsExitCode::Success.into();
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!(
        "Starting dodns: {} domain(s), cache: {}{}",
        settings.config.domains.len(),
        settings.config.state_store.type_name(),
        if settings.config.provider.dry_run { ", DRY-RUN" } else { "" }
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(settings.config) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        match engine.run_once().await {
            Ok(outcome) => {
                report(&outcome);
                DdnsExitCode::Success
            }
            Err(e) => {
                if e.is_provider_error() {
                    error!("DigitalOcean API error: {}", e);
                } else {
                    error!("Run failed: {}", e);
                }
                warn!("Cache left unchanged; the next run will retry");
                DdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the concrete components into an engine
fn build_engine(config: UpdaterConfig) -> Result<DdnsEngine> {
    let ip_source =
        HttpIpSource::from_config(&config.ip_source).context("Failed to build IP source")?;
    let provider = DigitalOceanProvider::from_config(&config.provider)
        .context("Failed to build DigitalOcean provider")?;
    let state_store = dodns_core::state::from_config(&config.state_store);

    DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        state_store,
        config,
    )
    .context("Failed to create engine")
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Unchanged { current_ip } => {
            info!("Run complete: {} already propagated", current_ip);
        }
        RunOutcome::Updated { new_ip, reports, .. } => {
            info!(
                "Run complete: {} propagated to {} domain(s), {} record(s) rewritten",
                new_ip,
                reports.len(),
                outcome.records_updated()
            );
        }
        RunOutcome::DryRun { new_ip, .. } => {
            info!(
                "Dry run complete: {} record(s) would be set to {}, cache not written",
                outcome.records_pending(),
                new_ip
            );
        }
    }
}
