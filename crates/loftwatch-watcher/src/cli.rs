//! Command-line arguments

use crate::config::{ConfigError, Profile, WatcherConfig};
use clap::Parser;
use std::path::PathBuf;

/// Loftwatch - Watch a live event page and report arrivals as they change.
#[derive(Debug, Parser)]
#[command(name = "loftwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Event page to watch
    pub url: String,

    /// Configuration file path
    #[arg(short, long, env = "LOFTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Collector base URL
    #[arg(long, env = "LOFTWATCH_BASE_URL")]
    pub base_url: Option<String>,

    /// Page profile (arrivals or baskets)
    #[arg(short, long)]
    pub profile: Option<Profile>,
}

impl Cli {
    /// Build the effective configuration
    ///
    /// Starts from the config file when one is given, otherwise from the
    /// defaults, then applies the command-line overrides.
    pub fn resolve_config(&self) -> Result<WatcherConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => WatcherConfig::from_file(path)?,
            None => WatcherConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }

        config.validate()?;
        Ok(config)
    }
}
