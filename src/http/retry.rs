//! Retry policy and error classification for network operations.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Default number of attempts for operations that opt into retrying.
pub const MAX_RETRIES: usize = 3;

/// Default delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Exactly one attempt, no retries.
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// One attempt plus `retries` additional ones.
    pub fn with_retries(retries: usize) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// Errors that should not be retried.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    /// HTTP 403 with a rate limit message, or 429
    #[error(
        "Rate limit exceeded: {0}. Try again later or set GITHUB_TOKEN environment variable."
    )]
    RateLimitExceeded(String),
    /// HTTP 401
    #[error("Authentication failed: {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),
    /// HTTP 404
    #[error("Not found: {0}")]
    NotFound(String),
    /// HTTP 403 without a rate limit message
    #[error("Access forbidden: {0}. You may need authentication.")]
    Forbidden(String),
    /// Other 4xx responses
    #[error("Request error: {0}")]
    ClientError(String),
    /// The server answered but the body could not be decoded
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    if error.is_decode() {
        return Err(NonRetryableError::MalformedBody(error.to_string()));
    }

    if let Some(status) = error.status() {
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(NonRetryableError::AuthenticationFailed(
                    "Invalid or missing authentication token".to_string(),
                ));
            }
            StatusCode::FORBIDDEN => {
                let msg = error.to_string();
                if msg.contains("rate limit") {
                    return Err(NonRetryableError::RateLimitExceeded(
                        "GitHub API rate limit exceeded".to_string(),
                    ));
                }
                return Err(NonRetryableError::Forbidden(
                    "Access to this resource is forbidden".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(NonRetryableError::RateLimitExceeded(
                    "Too many requests".to_string(),
                ));
            }
            StatusCode::NOT_FOUND => {
                return Err(NonRetryableError::NotFound(
                    error
                        .url()
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| "resource".to_string()),
                ));
            }
            s if s.is_client_error() => {
                return Err(NonRetryableError::ClientError(format!(
                    "HTTP {} error",
                    s.as_u16()
                )));
            }
            // 5xx server errors are retryable
            _ => {}
        }
    }

    // Connection errors, timeouts, etc. are retryable
    Ok(())
}

/// Converts a reqwest error into an anyhow error, wrapping it in a
/// [`NonRetryableError`] when retrying cannot help.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

/// Everything that is not explicitly non-retryable may be retried.
pub(crate) fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
