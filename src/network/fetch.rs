//! Network Fetch Module
//!
//! The outbound fetch seam the strategies call through, with a reqwest
//! implementation for production use.

use async_trait::async_trait;

use crate::error::{CacheError, Result};
use crate::network::response::CachedResponse;

// == Fetch ==
/// Outbound HTTP fetch.
///
/// Implementations return `CacheError::Network` for transport failures.
/// Non-2xx responses come back as responses, not errors, so each strategy
/// decides for itself how to treat them.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<CachedResponse>;
}

// == HTTP Fetcher ==
/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<CachedResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let date = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(CachedResponse::new(url, status, content_type, body).with_date_header(date.as_deref()))
    }
}
