//! Session configuration inputs
//!
//! Loading from files or the environment is left to the embedding
//! application. This module only defines the values a session needs and
//! their JSON form, so any loader can hand them over.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest device name the host accepts in DEVNAME
pub const MAX_DEVICE_NAME_LEN: usize = 10;

/// Largest record the two-byte GDS length field can describe
pub const MAX_RECORD_LEN: usize = u16::MAX as usize;

/// Smallest usable record limit: a bare GDS header
const MIN_RECORD_LEN: usize = 10;

/// Display geometry requested for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScreenGeometry {
    /// 24 rows by 80 columns
    #[default]
    Standard,
    /// 27 rows by 132 columns
    Wide,
}

impl ScreenGeometry {
    pub fn rows(&self) -> usize {
        match self {
            ScreenGeometry::Standard => 24,
            ScreenGeometry::Wide => 27,
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            ScreenGeometry::Standard => 80,
            ScreenGeometry::Wide => 132,
        }
    }
}

/// Everything a session needs to know before it connects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Codec id looked up in the codec registry, e.g. "37" or "939"
    pub codepage: String,
    pub geometry: ScreenGeometry,
    /// Device name sent as DEVNAME; the host generates one when absent
    pub device_name: Option<String>,
    /// Overrides the terminal type derived from geometry and codepage
    pub terminal_type: Option<String>,
    /// KBDTYPE value sent during environment negotiation
    pub keyboard_type: String,
    /// Interval between keepalive timing marks in milliseconds, 0 disables
    pub keepalive_interval_ms: u64,
    /// How long a keepalive timing mark may stay unanswered
    pub keepalive_timeout_ms: u64,
    /// Maximum number of outbound records waiting to be written
    pub outbound_queue_depth: usize,
    /// Extra USERVARs offered during environment negotiation
    pub environment: BTreeMap<String, String>,
    /// Longest inbound record accepted before the session fails
    pub max_record_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            codepage: "37".to_string(),
            geometry: ScreenGeometry::Standard,
            device_name: None,
            terminal_type: None,
            keyboard_type: "USB".to_string(),
            keepalive_interval_ms: 0,
            keepalive_timeout_ms: 10_000,
            outbound_queue_depth: 16,
            environment: BTreeMap::new(),
            max_record_len: MAX_RECORD_LEN,
        }
    }
}

impl SessionConfig {
    pub fn with_codepage(mut self, codepage: impl Into<String>) -> Self {
        self.codepage = codepage.into();
        self
    }

    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    pub fn with_geometry(mut self, geometry: ScreenGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keepalive_interval_ms = interval.as_millis() as u64;
        self.keepalive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Keepalive interval, or `None` when keepalive is disabled
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive_interval_ms > 0).then(|| Duration::from_millis(self.keepalive_interval_ms))
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_millis(self.keepalive_timeout_ms)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codepage.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "codepage",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(name) = &self.device_name {
            if name.is_empty() || name.len() > MAX_DEVICE_NAME_LEN {
                return Err(ConfigError::InvalidValue {
                    key: "device_name",
                    reason: format!("must be 1 to {MAX_DEVICE_NAME_LEN} characters"),
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || "#$@_".contains(c)) {
                return Err(ConfigError::InvalidValue {
                    key: "device_name",
                    reason: format!("{name:?} contains characters the host rejects"),
                });
            }
        }
        if self.outbound_queue_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "outbound_queue_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(MIN_RECORD_LEN..=MAX_RECORD_LEN).contains(&self.max_record_len) {
            return Err(ConfigError::InvalidValue {
                key: "max_record_len",
                reason: format!("must be between {MIN_RECORD_LEN} and {MAX_RECORD_LEN}"),
            });
        }
        if self.keepalive_interval_ms > 0 && self.keepalive_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "keepalive_timeout_ms",
                reason: "must be positive when keepalive is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// How a borrow behaves when every pooled session is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Fail at once
    #[default]
    Immediate,
    /// Wait until a session is returned or the pool shuts down
    Queued,
    /// Wait up to `acquisition_timeout_ms`
    TimeoutOnFull,
}

/// When pooled sessions are checked for a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStrategy {
    #[default]
    None,
    OnBorrow,
    OnReturn,
    /// Idle sessions are checked every `validation_interval_ms`
    Periodic,
}

/// Which idle sessions the pool discards on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    #[default]
    None,
    /// Idle longer than `max_idle_time_ms`
    IdleTime,
    /// Created longer than `max_age_ms` ago
    MaxAge,
}

/// Sizing and housekeeping for a session pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPoolConfig {
    /// Upper bound on idle plus borrowed sessions, 0 for no bound
    pub max_size: usize,
    /// Sessions opened when the pool starts
    pub min_idle: usize,
    pub acquisition_mode: AcquisitionMode,
    pub acquisition_timeout_ms: u64,
    pub validation: ValidationStrategy,
    pub validation_interval_ms: u64,
    pub eviction: EvictionPolicy,
    pub max_idle_time_ms: u64,
    pub max_age_ms: u64,
}

impl Default for SessionPoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: 0,
            acquisition_mode: AcquisitionMode::Immediate,
            acquisition_timeout_ms: 5_000,
            validation: ValidationStrategy::None,
            validation_interval_ms: 60_000,
            eviction: EvictionPolicy::None,
            max_idle_time_ms: 5 * 60_000,
            max_age_ms: 30 * 60_000,
        }
    }
}

impl SessionPoolConfig {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_acquisition(mut self, mode: AcquisitionMode, timeout: Duration) -> Self {
        self.acquisition_mode = mode;
        self.acquisition_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_validation(mut self, validation: ValidationStrategy) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }

    pub fn validation_interval(&self) -> Duration {
        Duration::from_millis(self.validation_interval_ms)
    }

    pub fn max_idle_time(&self) -> Duration {
        Duration::from_millis(self.max_idle_time_ms)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size > 0 && self.min_idle > self.max_size {
            return Err(ConfigError::InvalidValue {
                key: "min_idle",
                reason: format!("must not exceed max_size ({})", self.max_size),
            });
        }
        let periods = [
            ("acquisition_timeout_ms", self.acquisition_timeout_ms, self.acquisition_mode == AcquisitionMode::TimeoutOnFull),
            ("validation_interval_ms", self.validation_interval_ms, self.validation == ValidationStrategy::Periodic),
            ("max_idle_time_ms", self.max_idle_time_ms, self.eviction == EvictionPolicy::IdleTime),
            ("max_age_ms", self.max_age_ms, self.eviction == EvictionPolicy::MaxAge),
        ];
        for (key, value, in_use) in periods {
            if in_use && value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must be positive".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate pool configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionPoolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
