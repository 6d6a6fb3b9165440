//! AWS error classification
//!
//! Provides typed errors for Auto Scaling calls using the `.code()` metadata
//! of SDK errors instead of string matching on their Debug format.

use aws_sdk_autoscaling::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// Provider error categories for retry and cache logic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Rate limit exceeded (retried once, then terminal)
    #[error("Rate limit exceeded ({code}): {message}")]
    Throttled { code: String, message: String },

    /// Single launch configuration lookup matched nothing
    #[error("Launch configuration not found: {name}")]
    NotFound { name: String },

    /// Any other SDK failure (network, permissions, validation)
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl ProviderError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProviderError::Throttled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// The AWS error code, when the provider returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Throttled { code, .. } => Some(code),
            ProviderError::NotFound { .. } => None,
            ProviderError::Sdk { code, .. } => code.as_deref(),
        }
    }
}

/// Error codes the AWS SDKs treat as throttling
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "TransactionInProgressException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "LimitExceededException",
    "RequestThrottled",
    "SlowDown",
    "PriorRequestNotComplete",
    "EC2ThrottledException",
];

/// Classify an error from its AWS error code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> ProviderError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if THROTTLING_CODES.contains(&c) => ProviderError::Throttled {
            code: c.to_string(),
            message,
        },
        _ => ProviderError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error.
///
/// Errors without a message (dispatch or timeout failures) keep the full
/// error context so the cause is not lost.
pub fn classify_sdk_error<E>(error: &E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.message() {
        Some(message) => classify_aws_error(error.code(), Some(message)),
        None => {
            let context = DisplayErrorContext(error).to_string();
            classify_aws_error(error.code(), Some(&context))
        }
    }
}
