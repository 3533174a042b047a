//! HTTP Fetcher Adapter
//!
//! Implements the `ResourceFetcher` port with a pooled `reqwest` client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::domain::ResourceFetcher;
use crate::error::{Error, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("mediaflow/", env!("CARGO_PKG_VERSION"));

/// HTTP GET fetcher for CDN-hosted resources
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Create a fetcher without a client-side timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Create a fetcher whose requests give up after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await.map_err(|e| {
            match (e.is_timeout(), self.timeout) {
                (true, Some(timeout)) => Error::FetchTimeout {
                    url: url.to_string(),
                    timeout,
                },
                _ => Error::HttpClient(e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: format!("failed reading body: {}", e),
        })?;
        debug!(bytes = body.len(), "Fetched resource");
        Ok(body)
    }
}
