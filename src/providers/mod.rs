// Collaborator seams - trait objects injected into the orchestration core

pub mod command;
pub mod fakes;

pub use command::CommandProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TierConfig;
use crate::execution::ErrorCode;
use crate::issues::Issue;

/// Outcome reported by the external implementation step.
/// `error_code` carries the provider's own vocabulary; the execution handler
/// maps it onto the closed [`ErrorCode`] set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub success: bool,
    pub artifact_ref: Option<String>,
    pub error_code: Option<String>,
}

impl ProviderOutcome {
    pub fn succeeded(artifact_ref: Option<String>) -> Self {
        Self {
            success: true,
            artifact_ref,
            error_code: None,
        }
    }

    pub fn failed(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            artifact_ref: None,
            error_code: Some(error_code.into()),
        }
    }
}

/// Transport-level failure talking to a collaborator, already classified.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: ErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The external agent (AI or human tooling) that turns an issue into commits
/// on a branch.
#[async_trait]
pub trait ImplementationProvider: Send + Sync {
    async fn execute(
        &self,
        issue: &Issue,
        branch_name: &str,
        tier: &TierConfig,
    ) -> Result<ProviderOutcome, ProviderError>;
}

/// Remote version-control operations. Branch creation is assumed idempotent
/// by design; a logically abandoned attempt may still complete it remotely.
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn branch_exists(&self, name: &str) -> Result<bool, ProviderError>;
    async fn create_branch(&self, name: &str) -> Result<(), ProviderError>;
    async fn merge_branch(&self, name: &str) -> Result<(), ProviderError>;
    async fn delete_branch(&self, name: &str) -> Result<(), ProviderError>;
}

/// Invoked only for critical errors.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify_administrators(
        &self,
        tier: &str,
        issue: &Issue,
        error: ErrorCode,
    ) -> Result<(), ProviderError>;
}
