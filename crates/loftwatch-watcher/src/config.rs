//! Configuration for the watcher
//!
//! Timeouts, settle delays and the session budget, loaded from TOML and
//! overridable from the command line.

use loftwatch_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Watcher configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which page the watcher is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Event page: report the arrivals counter
    #[default]
    Arrivals,

    /// Basket table: log every new basket event
    Baskets,
}

impl Profile {
    /// Get the profile name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Arrivals => "arrivals",
            Profile::Baskets => "baskets",
        }
    }

    /// Parse a profile from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrivals" => Some(Profile::Arrivals),
            "baskets" => Some(Profile::Baskets),
            _ => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::parse(s).ok_or_else(|| format!("Unknown profile '{}' (expected arrivals or baskets)", s))
    }
}

/// Configuration for the watcher
///
/// Every field has a default, so a config file only needs the values it
/// changes.
///
/// # Examples
///
/// ```
/// use loftwatch_watcher::WatcherConfig;
///
/// let config = WatcherConfig::default();
/// assert_eq!(config.session_budget_secs, 300);
///
/// // Short sessions, quick restarts
/// let config = WatcherConfig::aggressive();
/// assert_eq!(config.session_budget_secs, 120);
///
/// // Long sessions, patient readiness wait
/// let config = WatcherConfig::lenient();
/// assert_eq!(config.session_budget_secs, 600);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Collector base URL; reports go to `{base_url}/api/events/update`
    pub base_url: String,

    /// Give up on the page if it is not ready after this long
    /// Default: 60 seconds
    pub readiness_timeout_secs: u64,

    /// Interval between readiness checks
    /// Default: 500 ms
    pub readiness_poll_interval_ms: u64,

    /// Delay after navigation before readiness polling starts
    /// Default: 5 seconds
    pub post_load_settle_secs: u64,

    /// Delay before change observation is attached
    /// Default: 5 seconds
    pub pre_observe_settle_secs: u64,

    /// Wall-clock ceiling of one session, measured from its start
    /// Default: 300 seconds (5 minutes)
    pub session_budget_secs: u64,

    /// Pause before restarting after a failed session
    /// Default: 5 seconds
    pub failure_backoff_secs: u64,

    /// Outbound reports buffered per session before new ones are dropped
    pub report_queue_capacity: usize,

    /// Mutation batches buffered between the provider and the session
    pub mutation_channel_capacity: usize,

    /// Timeout of each report request
    /// Default: 10 seconds
    pub request_timeout_secs: u64,

    /// Page profile
    pub profile: Profile,

    /// Refresh interval of the HTTP document provider
    /// Default: 2000 ms
    pub poll_interval_ms: u64,

    /// Class names and labels of the event page
    pub extractor: ExtractorConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://live.myloft.ro".to_string(),
            readiness_timeout_secs: 60,
            readiness_poll_interval_ms: 500,
            post_load_settle_secs: 5,
            pre_observe_settle_secs: 5,
            session_budget_secs: 300,
            failure_backoff_secs: 5,
            report_queue_capacity: 64,
            mutation_channel_capacity: 64,
            request_timeout_secs: 10,
            profile: Profile::Arrivals,
            poll_interval_ms: 2_000,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl WatcherConfig {
    /// Short sessions and quick restarts
    ///
    /// Suitable for pages that go stale quickly.
    ///
    /// - Session budget: 2 minutes
    /// - Readiness timeout: 30 seconds
    /// - Settle delays: 2 seconds
    /// - Page refresh: every second
    pub fn aggressive() -> Self {
        Self {
            readiness_timeout_secs: 30,
            readiness_poll_interval_ms: 250,
            post_load_settle_secs: 2,
            pre_observe_settle_secs: 2,
            session_budget_secs: 120,
            failure_backoff_secs: 2,
            request_timeout_secs: 5,
            poll_interval_ms: 1_000,
            ..Self::default()
        }
    }

    /// Long sessions and a patient readiness wait
    ///
    /// Suitable for slow connections or heavily loaded pages.
    ///
    /// - Session budget: 10 minutes
    /// - Readiness timeout: 2 minutes
    /// - Settle delays: 10 seconds
    /// - Page refresh: every 5 seconds
    pub fn lenient() -> Self {
        Self {
            readiness_timeout_secs: 120,
            readiness_poll_interval_ms: 1_000,
            post_load_settle_secs: 10,
            pre_observe_settle_secs: 10,
            session_budget_secs: 600,
            failure_backoff_secs: 15,
            request_timeout_secs: 20,
            poll_interval_ms: 5_000,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: WatcherConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        let positive = [
            ("readiness_timeout_secs", self.readiness_timeout_secs),
            ("readiness_poll_interval_ms", self.readiness_poll_interval_ms),
            ("session_budget_secs", self.session_budget_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("poll_interval_ms", self.poll_interval_ms),
            ("report_queue_capacity", self.report_queue_capacity as u64),
            ("mutation_channel_capacity", self.mutation_channel_capacity as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
        }

        self.extractor.validate().map_err(ConfigError::Invalid)
    }

    /// Get readiness timeout as Duration
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    /// Get readiness poll interval as Duration
    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    /// Get post-load settle delay as Duration
    pub fn post_load_settle(&self) -> Duration {
        Duration::from_secs(self.post_load_settle_secs)
    }

    /// Get pre-observe settle delay as Duration
    pub fn pre_observe_settle(&self) -> Duration {
        Duration::from_secs(self.pre_observe_settle_secs)
    }

    /// Get session budget as Duration
    pub fn session_budget(&self) -> Duration {
        Duration::from_secs(self.session_budget_secs)
    }

    /// Get failure backoff as Duration
    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    /// Get report request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get HTTP provider refresh interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
