use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

/// Rate-limit state reported with a response. Endpoints that omit the
/// headers are treated as unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit {
            limit: u64::MAX,
            remaining: u64::MAX,
            reset_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> RateLimit {
        let defaults = RateLimit::default();
        let rate = RateLimit {
            limit: header_u64(headers, "x-ratelimit-limit").unwrap_or(defaults.limit),
            remaining: header_u64(headers, "x-ratelimit-remaining").unwrap_or(defaults.remaining),
            reset_at: header_u64(headers, "x-ratelimit-reset")
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .unwrap_or(defaults.reset_at),
        };

        if rate.is_exhausted() {
            warn!(
                "Rate limit reached ({} requests); resets at {}",
                rate.limit, rate.reset_at
            );
        } else if rate.limit != u64::MAX {
            debug!("Rate limit: {}/{}", rate.remaining, rate.limit);
        }
        rate
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn reads_github_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("30"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate.limit, 30);
        assert_eq!(rate.remaining, 0);
        assert_eq!(rate.reset_at.timestamp(), 1_700_000_000);
        assert!(rate.is_exhausted());
    }

    #[test]
    fn missing_headers_mean_unlimited() {
        let rate = RateLimit::from_headers(&HeaderMap::new());
        assert_eq!(rate, RateLimit::default());
        assert!(!rate.is_exhausted());
    }

    #[test]
    fn malformed_values_fall_back_individually() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("lots"));
        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate.limit, 5000);
        assert_eq!(rate.remaining, u64::MAX);
    }
}
