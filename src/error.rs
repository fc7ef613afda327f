//! Error taxonomy for the generation pipeline.
//!
//! Only [`PipelineError`] ever reaches the caller of a job. Everything below
//! it is per-endpoint and ends up rendered as a fallback notice in the job
//! result.

use std::time::Duration;
use thiserror::Error;

/// Document-level failures. These abort a job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The schema text is not valid JSON.
    #[error("Invalid JSON schema format: {0}")]
    Parse(String),
    /// The schema parsed but contains no recognised operations.
    #[error("No valid endpoints found in the schema")]
    NoEndpoints,
}

/// Raised by the [`RateGate`](crate::rate_gate::RateGate) when a caller's
/// window is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rate limit exceeded. Try again in {retry_after_secs} seconds.")]
pub struct RateLimitExceeded {
    /// Whole seconds until the caller's window resets (always >= 1).
    pub retry_after_secs: u64,
}

impl RateLimitExceeded {
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }
}

/// Failures talking to the documentation generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Upstream rate limit (HTTP 429 or a `rate_limit_exceeded` error code).
    #[error("{message}")]
    RateLimited { message: String },
    /// The service rejected its own credentials (`invalid_api_key`).
    #[error("Invalid API key configuration.")]
    InvalidCredentials,
    /// The endpoint description is too large for a single generation request.
    #[error("API schema is too large to process. Please try with a smaller schema. (~{estimated_tokens} tokens)")]
    PayloadTooLarge { estimated_tokens: usize },
    /// Any other non-success response. `message` is the service-supplied
    /// error when there is one, otherwise `HTTP <status>: <reason>`.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Connection, timeout or TLS failure before a response arrived.
    #[error("Transport error: {0}")]
    Transport(String),
    /// A success response whose body did not carry a summary.
    #[error("Malformed service response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Build the generic message used when the service sent no error text.
    pub fn http_status(status: http::StatusCode, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });
        ServiceError::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        match self {
            ServiceError::RateLimited { .. } => RetryClass::RateLimited,
            _ => RetryClass::Transient,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::MalformedResponse(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Which backoff schedule a failed attempt falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Rate limited (locally or upstream): long backoff.
    RateLimited,
    /// Everything else: short backoff.
    Transient,
}

/// The error observed on a single generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Gate(#[from] RateLimitExceeded),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AttemptError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            AttemptError::Gate(_) => RetryClass::RateLimited,
            AttemptError::Service(err) => err.retry_class(),
        }
    }
}

/// Terminal failure of one endpoint's generation.
///
/// Gate rejections are retried like upstream rate limits, so they only
/// surface here as the `last` error of an exhausted budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Every attempt failed; carries the last observed error.
    #[error("{last}")]
    Exhausted { attempts: u32, last: AttemptError },
}
