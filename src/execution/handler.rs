use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::retry::{retry_idempotent, RetryConfig};
use super::{AttemptState, ErrorClass, ErrorCode, ValidationError};
use crate::analytics::{ExecutionRecord, PerformanceTracker};
use crate::branching::NamedBranch;
use crate::config::{SwitchyardConfig, TierConfig};
use crate::issues::Issue;
use crate::providers::{AdminNotifier, ImplementationProvider, ProviderError, ProviderOutcome, Vcs};
use crate::telemetry::generate_correlation_id;

/// Result of walking one issue's fallback chain.
#[derive(Debug)]
pub struct ChainOutcome {
    pub success: bool,
    /// Tier of the last attempt, whether it succeeded or the chain ran dry
    pub final_tier: String,
    /// One record per attempt, in chain order
    pub records: Vec<ExecutionRecord>,
    /// True when a critical error cut the chain short
    pub critical_abort: bool,
}

/// Drives the attempt state machine for one issue: runs the tier under its
/// time budget, classifies failures, and walks the fallback chain.
pub struct TierExecutionHandler {
    config: Arc<SwitchyardConfig>,
    provider: Arc<dyn ImplementationProvider>,
    vcs: Arc<dyn Vcs>,
    notifier: Arc<dyn AdminNotifier>,
    analytics: Arc<PerformanceTracker>,
    retry: RetryConfig,
}

impl TierExecutionHandler {
    pub fn new(
        config: Arc<SwitchyardConfig>,
        provider: Arc<dyn ImplementationProvider>,
        vcs: Arc<dyn Vcs>,
        notifier: Arc<dyn AdminNotifier>,
        analytics: Arc<PerformanceTracker>,
    ) -> Self {
        Self {
            config,
            provider,
            vcs,
            notifier,
            analytics,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Execute `issue` starting at `initial_tier`, falling back through the
    /// configured chain on transient failure. Bounded by the configured max
    /// depth and never revisiting a tier within one chain. Every attempt is
    /// recorded with the analytics manager before control returns.
    pub async fn execute_with_fallback(
        &self,
        issue: &Issue,
        branch: &NamedBranch,
        initial_tier: &str,
    ) -> Result<ChainOutcome, ValidationError> {
        let mut current = self.lookup_enabled(initial_tier)?;
        self.check_cooldown(current, issue)?;

        let max_depth = self.config.automation.max_fallback_depth.max(1) as usize;
        let mut attempted: HashSet<String> = HashSet::new();
        let mut records: Vec<ExecutionRecord> = Vec::new();
        let mut fallback_from: Option<String> = None;

        loop {
            attempted.insert(current.name.clone());
            let record = self
                .execute_attempt(issue, branch, current, fallback_from.clone())
                .await;
            let success = record.success;
            let error_code = record.error_code;
            self.analytics.record_execution(record.clone());
            records.push(record);

            if success {
                return Ok(ChainOutcome {
                    success: true,
                    final_tier: current.name.clone(),
                    records,
                    critical_abort: false,
                });
            }

            let code = error_code.unwrap_or(ErrorCode::SystemFailure);
            if code.class() == ErrorClass::Critical {
                error!(
                    tier.name = %current.name,
                    issue.number = issue.number,
                    error.code = code.as_str(),
                    "Critical failure, aborting chain and notifying administrators"
                );
                if let Err(notify_err) = self
                    .notifier
                    .notify_administrators(&current.name, issue, code)
                    .await
                {
                    warn!(
                        error = %notify_err,
                        "Administrator notification failed"
                    );
                }
                return Ok(ChainOutcome {
                    success: false,
                    final_tier: current.name.clone(),
                    records,
                    critical_abort: true,
                });
            }

            // Transient failure: look for a usable fallback tier
            let Some(next_name) = current.fallback_tier.as_deref() else {
                info!(
                    tier.name = %current.name,
                    issue.number = issue.number,
                    "No fallback configured, chain ends"
                );
                break;
            };
            if records.len() >= max_depth {
                warn!(
                    issue.number = issue.number,
                    depth = records.len(),
                    "Fallback chain reached max depth"
                );
                break;
            }
            if attempted.contains(next_name) {
                warn!(
                    tier.name = next_name,
                    issue.number = issue.number,
                    "Fallback tier already attempted in this chain"
                );
                break;
            }
            let next = match self.lookup_enabled(next_name) {
                Ok(tier) => tier,
                Err(err) => {
                    warn!(
                        tier.name = next_name,
                        issue.number = issue.number,
                        error = %err,
                        "Fallback tier unusable, chain ends"
                    );
                    break;
                }
            };
            if self.cooldown_remaining(next, issue).is_some() {
                warn!(
                    tier.name = %next.name,
                    issue.number = issue.number,
                    "Fallback tier in cooldown, chain ends"
                );
                break;
            }

            info!(
                from = %current.name,
                to = %next.name,
                issue.number = issue.number,
                error.code = code.as_str(),
                "Falling back after transient failure"
            );
            fallback_from = Some(current.name.clone());
            current = next;
        }

        Ok(ChainOutcome {
            success: false,
            final_tier: current.name.clone(),
            records,
            critical_abort: false,
        })
    }

    /// One tier attempt: Pending → Running → Succeeded/Failed. The time
    /// budget is enforced cooperatively; on expiry the in-flight provider
    /// call is abandoned, not terminated, so its eventual completion is not
    /// authoritative.
    async fn execute_attempt(
        &self,
        issue: &Issue,
        branch: &NamedBranch,
        tier: &TierConfig,
        fallback_from: Option<String>,
    ) -> ExecutionRecord {
        let correlation_id = generate_correlation_id();
        let mut state = AttemptState::Pending;
        info!(
            tier.name = %tier.name,
            issue.number = issue.number,
            branch = %branch.name,
            attempt.state = %state,
            correlation.id = %correlation_id,
            "Attempt queued"
        );

        let started_at = Utc::now();
        state = AttemptState::Running;
        info!(
            tier.name = %tier.name,
            issue.number = issue.number,
            attempt.state = %state,
            "Attempt running"
        );

        let budget = Duration::from_millis(tier.max_execution_time_ms);
        let outcome = timeout(budget, self.run_tier(issue, branch, tier)).await;

        let (success, error_code) = match outcome {
            Err(_elapsed) => {
                warn!(
                    tier.name = %tier.name,
                    issue.number = issue.number,
                    budget_ms = tier.max_execution_time_ms,
                    "Attempt exceeded its time budget, logically abandoned"
                );
                (false, Some(ErrorCode::Timeout))
            }
            Ok(Ok(result)) if result.success => (true, None),
            Ok(Ok(result)) => {
                let code = result
                    .error_code
                    .as_deref()
                    .map(ErrorCode::from_provider_code)
                    .unwrap_or(ErrorCode::ImplementationFailed);
                (false, Some(code))
            }
            Ok(Err(provider_err)) => (false, Some(provider_err.code)),
        };

        state = if success {
            AttemptState::Succeeded
        } else {
            AttemptState::Failed
        };
        info!(
            tier.name = %tier.name,
            issue.number = issue.number,
            attempt.state = %state,
            error.code = error_code.map(|c| c.as_str()),
            correlation.id = %correlation_id,
            "Attempt finished"
        );

        ExecutionRecord {
            tier: tier.name.clone(),
            issue_number: issue.number,
            started_at,
            finished_at: Utc::now(),
            success,
            error_code,
            branch_name: branch.name.clone(),
            fallback_from,
            correlation_id,
        }
    }

    /// Branch setup then the provider call. Branch operations are idempotent
    /// on the remote side and safe to retry; the provider call is not and
    /// runs at most once per attempt.
    async fn run_tier(
        &self,
        issue: &Issue,
        branch: &NamedBranch,
        tier: &TierConfig,
    ) -> Result<ProviderOutcome, ProviderError> {
        retry_idempotent(&self.retry, || async {
            if !self.vcs.branch_exists(&branch.name).await? {
                self.vcs.create_branch(&branch.name).await?;
            }
            Ok(())
        })
        .await?;

        self.provider.execute(issue, &branch.name, tier).await
    }

    fn lookup_enabled(&self, name: &str) -> Result<&TierConfig, ValidationError> {
        let tier = self
            .config
            .tier(name)
            .ok_or_else(|| ValidationError::UnknownTier(name.to_string()))?;
        if !tier.enabled {
            return Err(ValidationError::TierDisabled(name.to_string()));
        }
        Ok(tier)
    }

    fn cooldown_remaining(&self, tier: &TierConfig, issue: &Issue) -> Option<chrono::Duration> {
        if tier.cooldown_minutes == 0 {
            return None;
        }
        let last = self.analytics.last_attempt_at(&tier.name, issue.number)?;
        let window = chrono::Duration::minutes(tier.cooldown_minutes as i64);
        let elapsed = Utc::now() - last;
        (elapsed < window).then(|| window - elapsed)
    }

    fn check_cooldown(&self, tier: &TierConfig, issue: &Issue) -> Result<(), ValidationError> {
        if self.cooldown_remaining(tier, issue).is_some() {
            return Err(ValidationError::CooldownActive {
                tier: tier.name.clone(),
                issue: issue.number,
                cooldown_minutes: tier.cooldown_minutes,
            });
        }
        Ok(())
    }
}
