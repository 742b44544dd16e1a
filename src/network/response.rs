//! Network Response Module
//!
//! The request/response representations shared by the fetcher and the
//! response stores.

use chrono::DateTime;

use crate::cache::current_timestamp_ms;

// == Fetch Request ==
/// An outbound request as seen by the strategy layer.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// Top-level navigations may fall back to the offline document
    pub is_navigation: bool,
}

impl FetchRequest {
    /// A subresource or API request.
    pub fn resource(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_navigation: false,
        }
    }

    /// A top-level navigation request.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_navigation: true,
        }
    }
}

// == Cached Response ==
/// A fetched (or replayed) HTTP response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// Origin timestamp (Unix milliseconds): the upstream Date header when
    /// parseable, else the local receive time
    pub fetched_at: u64,
}

impl CachedResponse {
    // == Constructor ==
    /// Creates a response stamped with the local receive time.
    pub fn new(
        url: impl Into<String>,
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            content_type,
            body,
            fetched_at: current_timestamp_ms(),
        }
    }

    /// Re-stamps the response from an RFC 2822 `Date` header when one is
    /// present and parseable; keeps the receive time otherwise.
    pub fn with_date_header(mut self, date_header: Option<&str>) -> Self {
        if let Some(raw) = date_header {
            if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
                self.fetched_at = parsed.timestamp_millis().max(0) as u64;
            }
        }
        self
    }

    // == Is Success ==
    /// True for 2xx statuses; only these are worth storing.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    // == Age ==
    /// Milliseconds since this response was produced.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.fetched_at)
    }
}
