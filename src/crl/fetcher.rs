use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::timeout;
use tracing::info;
use url::Url;

use super::errors::FetchError;

/// Upper bound on a single CRL download, connect and transfer included
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves the raw body published at a CRL distribution point.
///
/// Implementations make exactly one attempt; retrying is left to the next
/// scheduled sweep.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP(S) fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpCrlFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpCrlFetcher {
    /// Returns an error if the HTTP client cannot be initialized
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Returns an error if the HTTP client cannot be initialized
    pub fn with_timeout(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            timeout: request_timeout,
        })
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let target = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&target, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Transport {
                url: target,
                detail: format!("HTTP error {}", response.status()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&target, e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl CrlFetcher for HttpCrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Fetching CRL at {}", url);

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        // The client timeout already covers the request; this one also bounds
        // slow body transfers and DNS resolution.
        match timeout(self.timeout, self.download(parsed)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }
    FetchError::Transport {
        url: url.to_string(),
        detail: error.to_string(),
    }
}
