use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while retrieving a CRL from its distribution point
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Timeout while fetching CRL")]
    Timeout,

    #[error("error fetching CRL at {url}: {detail}")]
    Transport { url: String, detail: String },

    #[error("Invalid CRL URL {url}: {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("HTTP client initialization failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised while extracting timestamps from raw CRL bytes
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("CRL parsing failed: {0}")]
    Der(String),

    #[error("CRL has no nextUpdate field")]
    MissingNextUpdate,

    #[error("CRL timestamp out of range: {0}")]
    Timestamp(i64),
}

/// Per distribution point refresh failure
#[derive(Error, Debug)]
pub enum CrlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Convenient Result type alias
pub type CrlResult<T> = Result<T, CrlError>;

/// Errors raised while loading or watching the monitor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error loading config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("CRL distribution point must not be empty")]
    EmptyDistributionPoint,

    #[error("refresh interval must be greater than zero")]
    ZeroRefreshInterval,

    #[error("config path {0} has no parent directory or file name")]
    InvalidPath(PathBuf),

    #[error("config watch error: {0}")]
    Watch(#[from] notify::Error),
}
