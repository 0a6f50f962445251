//! The monitored resource

use std::fmt;

/// The single resource watched by a running instance
///
/// Immutable for the lifetime of a session; every restarted session receives
/// its own clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorTarget {
    url: String,
}

impl MonitorTarget {
    /// Create a target for the given URL
    ///
    /// Returns `None` if the URL is blank or is not an http(s) URL.
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into().trim().to_string();
        if url.starts_with("http://") || url.starts_with("https://") {
            Some(Self { url })
        } else {
            None
        }
    }

    /// The target URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for MonitorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl std::str::FromStr for MonitorTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| format!("Invalid target URL: {}", s))
    }
}
