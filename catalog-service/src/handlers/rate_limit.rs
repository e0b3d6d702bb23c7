//! Rate-limit metadata echoed on product retrieval
//!
//! Throttling is enforced upstream; the service only reports what the
//! throttle attached to the inbound request, or configured placeholders.

use axum::http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Values reported under the envelope's `headers` member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    #[serde(rename = "X-RateLimit-Limit")]
    pub limit: String,
    #[serde(rename = "X-RateLimit-Remaining")]
    pub remaining: String,
    #[serde(rename = "X-RateLimit-Reset")]
    pub reset: String,
}

impl RateLimitInfo {
    pub fn new(
        limit: impl Into<String>,
        remaining: impl Into<String>,
        reset: impl Into<String>,
    ) -> Self {
        Self {
            limit: limit.into(),
            remaining: remaining.into(),
            reset: reset.into(),
        }
    }

    /// Read the inbound `X-RateLimit-*` headers, falling back per header
    pub fn from_headers(headers: &HeaderMap, defaults: &RateLimitConfig) -> Self {
        let read = |name: &HeaderName, fallback: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map_or_else(|| fallback.to_string(), str::to_string)
        };
        Self {
            limit: read(&X_RATELIMIT_LIMIT, &defaults.default_limit),
            remaining: read(&X_RATELIMIT_REMAINING, &defaults.default_remaining),
            reset: read(&X_RATELIMIT_RESET, &defaults.default_reset),
        }
    }
}
