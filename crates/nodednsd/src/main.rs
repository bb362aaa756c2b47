// # nodednsd - Node DNS Daemon
//
// Watches cluster membership and keeps two DNS records (internal and
// external member addresses) converged against the configured provider.
//
// This is a thin integration layer: all reconciliation logic lives in
// nodedns-core, all provider specifics in the provider crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS Provider
// - `NODEDNS_TOKEN`: DigitalOcean personal access token
// - `NODEDNS_ZONE`: name of the DNS zone the records live in
//
// ### Records
// - `NODEDNS_INTERNAL_RECORD`: record for the members' internal addresses
// - `NODEDNS_EXTERNAL_RECORD`: record for the members' external addresses
//   (leaving one empty disables that side; at least one must be set)
//
// ### Engine
// - `NODEDNS_TTL_SECS`: TTL applied to created records (default 60)
// - `NODEDNS_RESYNC_SECS`: periodic resync interval, 0 disables (default 300)
// - `NODEDNS_NOTIFY_TIMEOUT_SECS`: notification deadline (default 10)
// - `NODEDNS_DRY_RUN`: compute but do not apply DNS changes
// - `NODEDNS_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export NODEDNS_TOKEN=your_token
// export NODEDNS_ZONE=example.com
// export NODEDNS_EXTERNAL_RECORD=nodes.example.com
//
// nodednsd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

#[cfg(feature = "digitalocean")]
use nodedns_core::{DnsUpdateSink, MemberRegistry, Reconciler, RecordTargets};
#[cfg(feature = "digitalocean")]
use nodedns_provider_digitalocean::DigitalOceanProvider;

/// Exit codes, following systemd conventions:
/// - 0: clean shutdown
/// - 1: configuration or startup error
/// - 2: runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NodednsExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<NodednsExitCode> for ExitCode {
    fn from(code: NodednsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    token: String,
    zone: String,
    internal_record: String,
    external_record: String,
    ttl_secs: u64,
    resync_secs: u64,
    notify_timeout_secs: u64,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            token: env::var("NODEDNS_TOKEN").unwrap_or_default(),
            zone: env::var("NODEDNS_ZONE").unwrap_or_default(),
            internal_record: env::var("NODEDNS_INTERNAL_RECORD").unwrap_or_default(),
            external_record: env::var("NODEDNS_EXTERNAL_RECORD").unwrap_or_default(),
            ttl_secs: parse_env("NODEDNS_TTL_SECS", 60)?,
            resync_secs: parse_env("NODEDNS_RESYNC_SECS", 300)?,
            notify_timeout_secs: parse_env("NODEDNS_NOTIFY_TIMEOUT_SECS", 10)?,
            dry_run: matches!(
                env::var("NODEDNS_DRY_RUN").unwrap_or_default().as_str(),
                "1" | "true" | "yes"
            ),
            log_level: env::var("NODEDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            anyhow::bail!(
                "NODEDNS_TOKEN is required. \
                Set it via: export NODEDNS_TOKEN=your_token"
            );
        }

        if self.zone.is_empty() {
            anyhow::bail!(
                "NODEDNS_ZONE is required. \
                Set it via: export NODEDNS_ZONE=example.com"
            );
        }

        if self.internal_record.is_empty() && self.external_record.is_empty() {
            anyhow::bail!(
                "At least one of NODEDNS_INTERNAL_RECORD / NODEDNS_EXTERNAL_RECORD \
                must be set"
            );
        }

        for record in [&self.internal_record, &self.external_record] {
            if !record.is_empty() {
                validate_domain_name(record)?;
            }
        }

        if self.ttl_secs == 0 {
            anyhow::bail!("NODEDNS_TTL_SECS must be > 0");
        }

        if self.notify_timeout_secs == 0 {
            anyhow::bail!("NODEDNS_NOTIFY_TIMEOUT_SECS must be > 0");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NODEDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse an optional numeric environment variable, rejecting garbage rather
/// than silently falling back.
fn parse_env(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

/// Basic DNS name validation per RFC 1035; not comprehensive, but catches
/// common configuration mistakes.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NodednsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NodednsExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NodednsExitCode::ConfigError.into();
    }

    info!("Starting nodednsd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NodednsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            NodednsExitCode::RuntimeError
        } else {
            NodednsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
#[cfg(feature = "digitalocean")]
async fn run_daemon(config: Config) -> Result<()> {
    let provider = Arc::new(DigitalOceanProvider::new(&config.token)?);
    info!(zone = %config.zone, "DigitalOcean provider initialized");

    let reconciler = Reconciler::new(
        provider,
        &config.zone,
        Duration::from_secs(config.ttl_secs),
    )
    .with_dry_run(config.dry_run);

    if config.dry_run {
        warn!("dry run enabled; intended DNS changes will be logged, not applied");
    }

    let sink = Arc::new(DnsUpdateSink::new(
        reconciler,
        RecordTargets {
            internal: config.internal_record.clone(),
            external: config.external_record.clone(),
        },
    ));
    let _registry = Arc::new(
        MemberRegistry::new("main", sink)
            .with_timeout(Duration::from_secs(config.notify_timeout_secs)),
    );

    if !config.internal_record.is_empty() {
        info!(record = %config.internal_record, "managing internal record");
    }
    if !config.external_record.is_empty() {
        info!(record = %config.external_record, "managing external record");
    }

    // TODO: run NodeDnsEngine here once the cluster watch feed crate lands;
    // the feed is deployment-specific and not compiled into this binary yet.
    warn!("no cluster membership feed is compiled in; idling until shutdown");

    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);
    info!("Shutting down daemon");

    Ok(())
}

/// Run the daemon (no provider compiled in)
#[cfg(not(feature = "digitalocean"))]
async fn run_daemon(_config: Config) -> Result<()> {
    anyhow::bail!("no DNS provider feature enabled; rebuild with --features digitalocean")
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Fallback implementation for non-Unix platforms (SIGINT only).
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
