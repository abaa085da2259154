use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::errors::ConfigError;

/// URL of a CRL distribution point.
///
/// The URL is both the fetch target and the `crldp` label of its metric
/// series, so it is kept verbatim: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct DistributionPoint(String);

impl DistributionPoint {
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyDistributionPoint);
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DistributionPoint {
    type Error = ConfigError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::new(url)
    }
}

impl TryFrom<&str> for DistributionPoint {
    type Error = ConfigError;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        Self::new(url)
    }
}

impl Borrow<str> for DistributionPoint {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DistributionPoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistributionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamps extracted from a successfully decoded CRL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrlFacts {
    /// `thisUpdate` of the CRL
    pub generation_time: DateTime<Utc>,
    /// `nextUpdate` of the CRL
    pub expiration_time: DateTime<Utc>,
}

/// Immutable snapshot of what is being monitored.
///
/// A new value is built on every reload and swapped in whole; nothing mutates
/// a published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Distribution points in configuration order, without duplicates
    pub crls: Vec<DistributionPoint>,
    /// Delay between scheduled sweeps, fixed for the lifetime of the process
    pub refresh_interval: Duration,
}

impl MonitorConfig {
    pub fn new(
        crls: impl IntoIterator<Item = DistributionPoint>,
        refresh_interval: Duration,
    ) -> Self {
        let mut crls: Vec<DistributionPoint> = crls.into_iter().collect();

        // Remove duplicates while preserving order
        let mut seen = HashSet::new();
        crls.retain(|dp| seen.insert(dp.clone()));

        Self {
            crls,
            refresh_interval,
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.crls.iter().any(|dp| dp.as_str() == url)
    }
}
