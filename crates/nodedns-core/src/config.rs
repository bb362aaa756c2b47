//! Configuration types for the nodedns system
//!
//! This module defines all configuration structures used throughout the
//! crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::projection::ProjectionKind;

/// Main nodedns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Target record names for the two projections
    #[serde(default)]
    pub records: RecordTargets,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl NodeDnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.records.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DigitalOcean provider
    DigitalOcean {
        /// Personal access token used to update DNS
        api_token: String,
        /// Name of the DNS zone the records live in
        zone: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::DigitalOcean { api_token, zone } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("DigitalOcean API token cannot be empty"));
                }
                if zone.is_empty() {
                    return Err(crate::Error::config("DNS zone cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::DigitalOcean { .. } => "digitalocean",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// The DNS record names the two projections are published under. An empty
/// name disables that side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordTargets {
    /// Record holding the members' internal addresses
    #[serde(default)]
    pub internal: String,

    /// Record holding the members' external addresses
    #[serde(default)]
    pub external: String,
}

impl RecordTargets {
    /// The configured record name for a projection kind ("" when disabled).
    pub fn for_kind(&self, kind: ProjectionKind) -> &str {
        match kind {
            ProjectionKind::Internal => &self.internal,
            ProjectionKind::External => &self.external,
        }
    }

    /// Validate the record targets
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.internal.is_empty() && self.external.is_empty() {
            return Err(crate::Error::config(
                "at least one of the internal/external record names must be set",
            ));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between periodic resyncs of current state to DNS, in
    /// seconds. Zero disables the resync ticker (not recommended: resync is
    /// the recovery path for lost change notifications).
    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,

    /// Worst-case time one change notification may block its registry
    /// operation, in seconds
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    /// TTL applied to newly-created records, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Compute and log intended DNS changes without applying them
    #[serde(default)]
    pub dry_run: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("record TTL must be > 0"));
        }
        if self.notify_timeout_secs == 0 {
            return Err(crate::Error::config("notification timeout must be > 0"));
        }
        Ok(())
    }

    /// The resync interval, or `None` when the ticker is disabled.
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_interval_secs: default_resync_interval_secs(),
            notify_timeout_secs: default_notify_timeout_secs(),
            ttl_secs: default_ttl_secs(),
            dry_run: false,
        }
    }
}

fn default_resync_interval_secs() -> u64 {
    300
}

fn default_notify_timeout_secs() -> u64 {
    10
}

fn default_ttl_secs() -> u64 {
    60
}
