//! Error taxonomy and retry policy for LLM requests.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a failed LLM request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// 429 from the provider; back off, honoring `Retry-After` when given.
    RateLimited,
    /// 5xx from the provider; usually transient.
    ServerError,
    /// 4xx other than 429; retrying will not help.
    ClientError,
    /// Connection-level failure (timeout, DNS, reset).
    NetworkError,
    /// The provider answered but the body was not what we expected.
    ParseError,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmErrorKind::RateLimited => "rate limited",
            LlmErrorKind::ServerError => "server error",
            LlmErrorKind::ClientError => "client error",
            LlmErrorKind::NetworkError => "network error",
            LlmErrorKind::ParseError => "parse error",
        };
        f.write_str(name)
    }
}

/// A failed LLM request, with enough context to decide whether to retry.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            message,
            status: Some(429),
            retry_after,
        }
    }

    pub fn server_error(status: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ServerError,
            message,
            status: Some(status),
            retry_after: None,
        }
    }

    pub fn client_error(status: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ClientError,
            message,
            status: Some(status),
            retry_after: None,
        }
    }

    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            message,
            status: None,
            retry_after: None,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            message,
            status: None,
            retry_after: None,
        }
    }

    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            LlmErrorKind::RateLimited | LlmErrorKind::ServerError | LlmErrorKind::NetworkError
        )
    }

    /// Delay to wait before the given (0-based) retry attempt.
    ///
    /// `Retry-After` wins when the provider sent one; otherwise exponential
    /// backoff starting at 500ms, capped at 30s.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }
        let backoff = Duration::from_millis(500).saturating_mul(2u32.saturating_pow(attempt));
        backoff.min(Duration::from_secs(30))
    }
}

/// Map an HTTP status to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

/// Bounds on automatic retrying.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn should_retry(&self, error: &LlmError) -> bool {
        error.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_status() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(400), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(404), LlmErrorKind::ClientError);
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::rate_limited("slow down".into(), None).is_transient());
        assert!(LlmError::server_error(502, "bad gateway".into()).is_transient());
        assert!(LlmError::network_error("reset".into()).is_transient());
        assert!(!LlmError::client_error(401, "bad key".into()).is_transient());
        assert!(!LlmError::parse_error("garbage".into()).is_transient());
    }

    #[test]
    fn test_retry_after_overrides_backoff() {
        let err = LlmError::rate_limited("slow down".into(), Some(Duration::from_secs(7)));
        assert_eq!(err.suggested_delay(0), Duration::from_secs(7));

        let err = LlmError::server_error(500, "oops".into());
        assert_eq!(err.suggested_delay(0), Duration::from_millis(500));
        assert_eq!(err.suggested_delay(2), Duration::from_millis(2000));
        // Capped.
        assert_eq!(err.suggested_delay(30), Duration::from_secs(30));
    }
}
