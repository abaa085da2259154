//! Certificate Revocation List (CRL) freshness monitoring
//!
//! This module watches a configured set of CRL distribution points and keeps
//! the generation and expiration time of each published CRL available for
//! scraping.
//!
//! # Features
//! - CRL fetching from configured distribution points
//! - Parsing CRLs to extract `thisUpdate` and `nextUpdate`
//! - Hot reload of the monitored distribution points
//! - Scheduled periodic sweeps with an out-of-band sweep after each reload

pub mod decoder;
mod errors;
pub mod fetcher;
pub mod metrics;
pub mod scheduler;
pub mod store;
mod types;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use decoder::decode_crl;
pub use errors::{ConfigError, CrlError, CrlResult, DecodeError, FetchError};
pub use fetcher::{CrlFetcher, FETCH_TIMEOUT, HttpCrlFetcher};
pub use metrics::CrlMetrics;
pub use scheduler::{CrlScheduler, SweepReport};
pub use store::ConfigStore;
pub use types::{CrlFacts, DistributionPoint, MonitorConfig};
pub use watcher::ConfigWatcher;
