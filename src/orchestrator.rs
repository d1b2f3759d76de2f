// Composition root - wires selection, naming, execution and analytics into
// a single automation call per issue

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use crate::analytics::{ExecutionRecord, PerformanceSummary, PerformanceTracker, TierAnomaly};
use crate::branching::{BranchError, BranchManager};
use crate::config::{ConfigError, SwitchyardConfig};
use crate::execution::{TierExecutionHandler, ValidationError};
use crate::issues::{Issue, IssueType};
use crate::providers::{AdminNotifier, ImplementationProvider, Vcs};
use crate::telemetry::{automation_span, generate_correlation_id};
use crate::tiers::{due_tiers, ScheduleLedger, SelectionOptions, SelectorError, TierSelection, TierSelector};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration invalid: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Branch(#[from] BranchError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Default)]
pub struct AutomationOptions {
    /// Route to this tier instead of letting the selector score
    pub force_tier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchOutcome {
    pub name: String,
    /// Template of the pattern that produced the name
    pub pattern: String,
}

/// Caller-visible result of one automation run: which tier ultimately ran,
/// whether fallback occurred, and every attempt's record.
#[derive(Debug, Serialize)]
pub struct AutomationOutcome {
    pub success: bool,
    pub tier: String,
    pub branch: BranchOutcome,
    pub executions: Vec<ExecutionRecord>,
    pub performance: PerformanceSummary,
    pub fallback_occurred: bool,
    pub critical_abort: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValidation {
    pub valid: bool,
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub initialized: bool,
    pub enabled_tiers: Vec<String>,
    pub config_validation: ConfigValidation,
}

pub struct Orchestrator {
    config: Arc<SwitchyardConfig>,
    selector: TierSelector,
    branch_manager: BranchManager,
    handler: TierExecutionHandler,
    analytics: Arc<PerformanceTracker>,
    vcs: Arc<dyn Vcs>,
    schedule: Mutex<ScheduleLedger>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Construct and validate. A config that fails validation never reaches
    /// an execution attempt.
    pub fn new(
        config: SwitchyardConfig,
        provider: Arc<dyn ImplementationProvider>,
        vcs: Arc<dyn Vcs>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let analytics = Arc::new(PerformanceTracker::from_config(&config.automation));
        let selector = TierSelector::new(config.automation.clone());
        let branch_manager = BranchManager::new(config.branch_patterns.clone());
        let handler = TierExecutionHandler::new(
            config.clone(),
            provider,
            vcs.clone(),
            notifier,
            analytics.clone(),
        );

        Ok(Self {
            config,
            selector,
            branch_manager,
            handler,
            analytics,
            vcs,
            schedule: Mutex::new(ScheduleLedger::new()),
            monitor: Mutex::new(None),
        })
    }

    /// Drive one issue through the full pipeline: classify, select a tier,
    /// derive a branch name, execute under the time budget with fallback,
    /// and return everything the caller needs to audit the run.
    pub async fn execute_automation_for_issue(
        &self,
        issue: &Issue,
        options: &AutomationOptions,
    ) -> Result<AutomationOutcome, OrchestratorError> {
        let correlation_id = generate_correlation_id();
        let span = automation_span(issue.number, &correlation_id);
        self.run_automation(issue, options).instrument(span).await
    }

    async fn run_automation(
        &self,
        issue: &Issue,
        options: &AutomationOptions,
    ) -> Result<AutomationOutcome, OrchestratorError> {
        let issue_type = IssueType::classify(issue);
        let snapshot = self.analytics.performance_snapshot();
        let selection = self.selector.select(
            &self.config.tiers,
            &snapshot,
            issue,
            issue_type,
            &SelectionOptions {
                force_tier: options.force_tier.clone(),
            },
        )?;
        info!(
            issue.number = issue.number,
            issue.kind = %issue_type,
            tier.name = %selection.tier,
            tier.confidence = selection.confidence,
            "Tier selected"
        );

        let branch = self
            .branch_manager
            .generate_branch_name(issue, issue_type, self.vcs.as_ref())
            .await?;
        info!(
            issue.number = issue.number,
            branch = %branch.name,
            pattern = %branch.pattern,
            "Branch name generated"
        );

        let chain = self
            .handler
            .execute_with_fallback(issue, &branch, &selection.tier)
            .await?;
        let performance = self.analytics.tier_summary(&chain.final_tier);
        let fallback_occurred = chain.records.len() > 1;

        Ok(AutomationOutcome {
            success: chain.success,
            tier: chain.final_tier,
            branch: BranchOutcome {
                name: branch.name,
                pattern: branch.pattern,
            },
            executions: chain.records,
            performance,
            fallback_occurred,
            critical_abort: chain.critical_abort,
        })
    }

    pub fn system_status(&self) -> SystemStatus {
        let problems = match self.config.validate() {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        };
        SystemStatus {
            initialized: true,
            enabled_tiers: self
                .config
                .enabled_tiers()
                .map(|t| t.name.clone())
                .collect(),
            config_validation: ConfigValidation {
                valid: problems.is_empty(),
                problems,
            },
        }
    }

    /// Preview likely routing for an issue without executing anything.
    pub fn recommend_tiers(&self, issue: &Issue) -> Vec<TierSelection> {
        self.analytics
            .recommend_tiers(&self.selector, &self.config.tiers, issue)
    }

    /// Candidate branch names a human may have created before automation ran,
    /// in pattern priority order.
    pub fn detect_existing_branches(&self, issue_number: u64) -> Vec<String> {
        self.branch_manager.detect_existing_branches(issue_number)
    }

    pub fn detect_anomalies(&self) -> Vec<TierAnomaly> {
        self.analytics
            .detect_anomalies(&self.config.tiers, &self.config.automation)
    }

    pub fn tier_summary(&self, tier: &str) -> PerformanceSummary {
        self.analytics.tier_summary(tier)
    }

    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    /// Pure schedule decision: which periodic tiers are due at `now`. The
    /// actual trigger (timer, CI, manual call) stays external.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<String> {
        let ledger = self.schedule.lock().unwrap_or_else(|e| e.into_inner());
        due_tiers(&self.config.tiers, &ledger, now)
    }

    pub fn record_scheduled_run(&self, tier: &str, at: DateTime<Utc>) {
        self.schedule
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record_run(tier, at);
    }

    /// Start the periodic anomaly sweep. Idempotent: a second call while a
    /// sweep is running is a no-op.
    pub fn start_monitoring(&self) {
        let mut guard = self.monitor.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return;
        }

        let analytics = self.analytics.clone();
        let config = self.config.clone();
        let period = Duration::from_secs(config.automation.monitor_interval_seconds.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let anomalies = analytics.detect_anomalies(&config.tiers, &config.automation);
                for anomaly in &anomalies {
                    warn!(
                        tier.name = %anomaly.tier,
                        anomaly = ?anomaly.kind,
                        "Tier performance anomaly detected"
                    );
                }
            }
        });
        *guard = Some(handle);
        info!("Monitoring started");
    }

    pub fn stop_monitoring(&self) {
        let mut guard = self.monitor.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("Monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}
