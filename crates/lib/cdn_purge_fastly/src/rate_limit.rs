use chrono::{DateTime, TimeZone as _, Utc};
use http::{HeaderMap, HeaderName};

// https://www.fastly.com/documentation/reference/api/#rate-limiting
pub(crate) const FASTLY_RATELIMIT_REMAINING: HeaderName =
    HeaderName::from_static("fastly-ratelimit-remaining");
pub(crate) const FASTLY_RATELIMIT_RESET: HeaderName =
    HeaderName::from_static("fastly-ratelimit-reset");

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RateLimitState {
    pub(crate) remaining: Option<u64>,
    pub(crate) reset: Option<DateTime<Utc>>,
}

impl RateLimitState {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: headers
                .get(FASTLY_RATELIMIT_REMAINING)
                .and_then(|hv| hv.to_str().ok())
                .and_then(|s| s.parse().ok()),
            reset: headers
                .get(FASTLY_RATELIMIT_RESET)
                .and_then(|hv| hv.to_str().ok())
                .and_then(|s| s.parse::<i64>().ok())
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }

    /// Seconds until the rate limit window resets, zero once it has passed.
    pub(crate) fn seconds_until_reset(&self, now: DateTime<Utc>) -> Option<u64> {
        self.reset
            .map(|reset| (reset - now).num_seconds().max(0) as u64)
    }
}
