// In-memory fake collaborators for tests - no side effects

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::{AdminNotifier, ImplementationProvider, ProviderError, ProviderOutcome, Vcs};
use crate::config::TierConfig;
use crate::execution::ErrorCode;
use crate::issues::Issue;

/// One planned provider response, optionally preceded by a simulated delay
/// so tests can drive the timeout path.
#[derive(Debug, Clone)]
pub struct PlannedCall {
    pub result: Result<ProviderOutcome, ProviderError>,
    pub delay: Option<Duration>,
}

impl PlannedCall {
    pub fn success() -> Self {
        Self {
            result: Ok(ProviderOutcome::succeeded(Some("fake-artifact".to_string()))),
            delay: None,
        }
    }

    pub fn failure(code: &str) -> Self {
        Self {
            result: Ok(ProviderOutcome::failed(code)),
            delay: None,
        }
    }

    pub fn transport_error(code: ErrorCode) -> Self {
        Self {
            result: Err(ProviderError::new(code, "scripted transport error")),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Implementation provider that plays back scripted outcomes in order.
/// Once the script is exhausted every further call succeeds.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<PlannedCall>>,
    calls: Mutex<Vec<(String, u64)>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<PlannedCall>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_succeeding() -> Self {
        Self::new(Vec::new())
    }

    /// (tier name, issue number) per call, in invocation order
    pub fn calls(&self) -> Vec<(String, u64)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ImplementationProvider for ScriptedProvider {
    async fn execute(
        &self,
        issue: &Issue,
        _branch_name: &str,
        tier: &TierConfig,
    ) -> Result<ProviderOutcome, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tier.name.clone(), issue.number));

        let planned = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(PlannedCall::success);

        if let Some(delay) = planned.delay {
            tokio::time::sleep(delay).await;
        }
        planned.result
    }
}

/// VCS backed by a branch set.
#[derive(Default)]
pub struct InMemoryVcs {
    branches: Mutex<HashSet<String>>,
    created: Mutex<Vec<String>>,
}

impl InMemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branches(names: &[&str]) -> Self {
        let vcs = Self::new();
        {
            let mut branches = vcs.branches.lock().unwrap_or_else(|e| e.into_inner());
            for name in names {
                branches.insert(name.to_string());
            }
        }
        vcs
    }

    pub fn created_branches(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Vcs for InMemoryVcs {
    async fn branch_exists(&self, name: &str) -> Result<bool, ProviderError> {
        Ok(self
            .branches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name))
    }

    async fn create_branch(&self, name: &str) -> Result<(), ProviderError> {
        self.branches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.to_string());
        Ok(())
    }

    async fn merge_branch(&self, name: &str) -> Result<(), ProviderError> {
        let known = self
            .branches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name);
        if known {
            Ok(())
        } else {
            Err(ProviderError::new(
                ErrorCode::TemporaryApiError,
                format!("unknown branch '{name}'"),
            ))
        }
    }

    async fn delete_branch(&self, name: &str) -> Result<(), ProviderError> {
        self.branches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        Ok(())
    }
}

/// Notifier that records every critical escalation it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, u64, ErrorCode)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, u64, ErrorCode)> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AdminNotifier for RecordingNotifier {
    async fn notify_administrators(
        &self,
        tier: &str,
        issue: &Issue,
        error: ErrorCode,
    ) -> Result<(), ProviderError> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tier.to_string(), issue.number, error));
        Ok(())
    }
}
