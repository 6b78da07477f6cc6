//! Client configuration.
//!
//! Loaded from JSON. Every field has a default, so an empty object is a valid
//! configuration:
//!
//! ```json
//! {
//!   "capacity": 1,
//!   "round_syncer": { "epoch_len": 10, "lead": 10, "intents": 4 },
//!   "round_fetch_timeout_ms": 5000,
//!   "debug": false
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use callwheel_core::RoundSyncer;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Parameters of the start-round convention. Caller and callee must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundSyncerConfig {
    pub epoch_len: u32,
    pub lead: u32,
    pub intents: u32,
}

impl RoundSyncerConfig {
    /// Build the syncer, checking the agreement inequality.
    pub fn build(&self) -> Result<RoundSyncer> {
        Ok(RoundSyncer::new(self.epoch_len, self.lead, self.intents)?)
    }
}

impl Default for RoundSyncerConfig {
    fn default() -> Self {
        let standard = RoundSyncer::STANDARD;
        Self {
            epoch_len: standard.epoch_len(),
            lead: standard.lead(),
            intents: standard.intents(),
        }
    }
}

/// Configuration for the call client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum number of simultaneously live sessions.
    pub capacity: usize,
    /// Start-round convention.
    pub round_syncer: RoundSyncerConfig,
    /// Upper bound on one latest-round fetch.
    pub round_fetch_timeout_ms: u64,
    /// Show every error, including the benign "round not configured" class.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            capacity: 1,
            round_syncer: RoundSyncerConfig::default(),
            round_fetch_timeout_ms: 5000,
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), capacity = config.capacity, "loaded client config");
        Ok(config)
    }

    /// Check the configuration for values the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ClientError::Config("capacity must be at least 1".into()));
        }
        if self.round_fetch_timeout_ms == 0 {
            return Err(ClientError::Config(
                "round_fetch_timeout_ms must be positive".into(),
            ));
        }
        self.round_syncer.build()?;
        Ok(())
    }

    /// The fetch timeout as a duration.
    pub fn round_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.round_fetch_timeout_ms)
    }
}
