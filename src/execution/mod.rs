// Tier execution: one attempt per tier, fallback chain on recoverable failure

pub mod handler;
pub mod retry;

pub use handler::{ChainOutcome, TierExecutionHandler};
pub use retry::{retry_idempotent, RetryConfig};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle of a single tier attempt. Failed attempts may start a new
/// Pending cycle on the configured fallback tier; Succeeded and the end of
/// the chain are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptState::Pending => "pending",
            AttemptState::Running => "running",
            AttemptState::Succeeded => "succeeded",
            AttemptState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Closed set of failure codes an attempt can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Timeout,
    RateLimitExceeded,
    TemporaryApiError,
    ResourceExhausted,
    /// The provider ran to completion but reported failure without a more
    /// specific code
    ImplementationFailed,
    AuthenticationFailed,
    PermissionDenied,
    SystemFailure,
}

/// How an error steers the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Eligible for fallback when the tier configures one
    Transient,
    /// Aborts the whole chain and notifies administrators
    Critical,
}

impl ErrorCode {
    pub fn class(self) -> ErrorClass {
        match self {
            ErrorCode::Timeout
            | ErrorCode::RateLimitExceeded
            | ErrorCode::TemporaryApiError
            | ErrorCode::ResourceExhausted
            | ErrorCode::ImplementationFailed => ErrorClass::Transient,
            ErrorCode::AuthenticationFailed
            | ErrorCode::PermissionDenied
            | ErrorCode::SystemFailure => ErrorClass::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::TemporaryApiError => "TEMPORARY_API_ERROR",
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorCode::ImplementationFailed => "IMPLEMENTATION_FAILED",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::SystemFailure => "SYSTEM_FAILURE",
        }
    }

    /// Map a provider-reported code string onto the closed set. Codes we do
    /// not recognize collapse to `ImplementationFailed` so an exotic upstream
    /// string can never bypass classification.
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "TIMEOUT" => ErrorCode::Timeout,
            "RATE_LIMIT_EXCEEDED" => ErrorCode::RateLimitExceeded,
            "TEMPORARY_API_ERROR" => ErrorCode::TemporaryApiError,
            "RESOURCE_EXHAUSTED" => ErrorCode::ResourceExhausted,
            "AUTHENTICATION_FAILED" => ErrorCode::AuthenticationFailed,
            "PERMISSION_DENIED" => ErrorCode::PermissionDenied,
            "SYSTEM_FAILURE" => ErrorCode::SystemFailure,
            _ => ErrorCode::ImplementationFailed,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejections raised before any execution attempt starts. Never retried and
/// never recorded as an attempt.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown tier '{0}'")]
    UnknownTier(String),
    #[error("tier '{0}' is disabled")]
    TierDisabled(String),
    #[error("tier '{tier}' attempted issue #{issue} again within its {cooldown_minutes}m cooldown")]
    CooldownActive {
        tier: String,
        issue: u64,
        cooldown_minutes: u64,
    },
    #[error("invalid branch name: {0}")]
    InvalidBranchName(#[from] crate::branching::BranchError),
    #[error("invalid tier configuration: {0}")]
    InvalidTierConfig(#[from] crate::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_codes() {
        for code in [
            ErrorCode::Timeout,
            ErrorCode::RateLimitExceeded,
            ErrorCode::TemporaryApiError,
            ErrorCode::ResourceExhausted,
            ErrorCode::ImplementationFailed,
        ] {
            assert_eq!(code.class(), ErrorClass::Transient);
        }
    }

    #[test]
    fn test_critical_codes() {
        for code in [
            ErrorCode::AuthenticationFailed,
            ErrorCode::PermissionDenied,
            ErrorCode::SystemFailure,
        ] {
            assert_eq!(code.class(), ErrorClass::Critical);
        }
    }

    #[test]
    fn test_provider_code_parsing() {
        assert_eq!(
            ErrorCode::from_provider_code("TIMEOUT"),
            ErrorCode::Timeout
        );
        assert_eq!(
            ErrorCode::from_provider_code("PERMISSION_DENIED"),
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            ErrorCode::from_provider_code("SOMETHING_NEW"),
            ErrorCode::ImplementationFailed
        );
    }

    #[test]
    fn test_code_display_roundtrip() {
        assert_eq!(
            ErrorCode::from_provider_code(ErrorCode::RateLimitExceeded.as_str()),
            ErrorCode::RateLimitExceeded
        );
    }
}
