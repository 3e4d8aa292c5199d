//! Cache entry snapshot
//!
//! A `CacheEntrySnapshot` captures what the validity engine needs to know
//! about a stored response: the two timestamps bracketing the exchange, the
//! status code and the full header list. It never holds the body.

use http::header::{AsHeaderName, DATE, EXPIRES, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::time::SystemTime;

/// Immutable timing and header metadata of a stored response.
#[derive(Debug, Clone)]
pub struct CacheEntrySnapshot {
    request_sent_at: SystemTime,
    response_received_at: SystemTime,
    status: StatusCode,
    headers: HeaderMap,
}

impl CacheEntrySnapshot {
    /// Capture a response.
    ///
    /// `request_sent_at` is expected to be no later than
    /// `response_received_at`; this is not checked.
    pub fn new(
        request_sent_at: SystemTime,
        response_received_at: SystemTime,
        status: StatusCode,
        headers: HeaderMap,
    ) -> Self {
        Self {
            request_sent_at,
            response_received_at,
            status,
            headers,
        }
    }

    /// Capture the head of an `http::Response`.
    pub fn from_response_parts(
        request_sent_at: SystemTime,
        response_received_at: SystemTime,
        parts: &http::response::Parts,
    ) -> Self {
        Self::new(
            request_sent_at,
            response_received_at,
            parts.status,
            parts.headers.clone(),
        )
    }

    pub fn request_sent_at(&self) -> SystemTime {
        self.request_sent_at
    }

    pub fn response_received_at(&self) -> SystemTime {
        self.response_received_at
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// All response headers, repeated names included
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether at least one header named `name` is present
    pub fn has_header<K: AsHeaderName>(&self, name: K) -> bool {
        self.headers.contains_key(name)
    }

    /// Parsed `Date` header, if present and well-formed
    pub fn date(&self) -> Option<SystemTime> {
        self.first_date(DATE)
    }

    /// Parsed `Last-Modified` header, if present and well-formed
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.first_date(LAST_MODIFIED)
    }

    /// Parsed `Expires` header, if present and well-formed
    pub fn expires(&self) -> Option<SystemTime> {
        self.first_date(EXPIRES)
    }

    // Only the first occurrence counts; a malformed first value hides any later one.
    fn first_date<K: AsHeaderName>(&self, name: K) -> Option<SystemTime> {
        self.headers.get(name).and_then(parse_http_date)
    }
}

/// Parse an HTTP-date (RFC 1123, RFC 850 or asctime format).
pub(crate) fn parse_http_date(value: &HeaderValue) -> Option<SystemTime> {
    let text = value.to_str().ok()?;
    httpdate::parse_http_date(text.trim()).ok()
}
