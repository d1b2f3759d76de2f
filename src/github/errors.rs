use thiserror::Error;

use crate::execution::ErrorCode;
use crate::providers::ProviderError;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub token not found: {0}")]
    TokenNotFound(String),
    #[error("GitHub repository not configured: {0}")]
    RepoNotConfigured(String),
    #[error("unexpected GitHub payload: {0}")]
    UnexpectedPayload(String),
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),
}

impl GitHubError {
    /// Collapse the HTTP surface onto the orchestration error taxonomy.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            GitHubError::TokenNotFound(_) => ErrorCode::AuthenticationFailed,
            GitHubError::RepoNotConfigured(_) => ErrorCode::SystemFailure,
            GitHubError::UnexpectedPayload(_) => ErrorCode::TemporaryApiError,
            GitHubError::Api(octocrab::Error::GitHub { source, .. }) => {
                let message = source.message.to_lowercase();
                match source.status_code.as_u16() {
                    401 => ErrorCode::AuthenticationFailed,
                    403 if message.contains("rate limit") => ErrorCode::RateLimitExceeded,
                    403 => ErrorCode::PermissionDenied,
                    429 => ErrorCode::RateLimitExceeded,
                    500..=599 => ErrorCode::TemporaryApiError,
                    _ => ErrorCode::TemporaryApiError,
                }
            }
            GitHubError::Api(_) => ErrorCode::TemporaryApiError,
        }
    }
}

impl From<GitHubError> for ProviderError {
    fn from(err: GitHubError) -> Self {
        ProviderError::new(err.error_code(), err.to_string())
    }
}
