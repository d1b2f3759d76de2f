// Switchyard Library - Tiered Issue Automation Orchestration
// This exposes the core components for testing and integration

pub mod analytics;
pub mod branching;
pub mod cli;
pub mod config;
pub mod execution;
pub mod github;
pub mod issues;
pub mod orchestrator;
pub mod providers;
pub mod telemetry;
pub mod tiers;

// Re-export key types for easy access
pub use analytics::{ExecutionRecord, PerformanceSummary, PerformanceTracker, TierAnomaly};
pub use branching::{BranchError, BranchManager, NamedBranch};
pub use config::{BranchPatternConfig, ConfigError, ScheduleKind, SwitchyardConfig, TierConfig};
pub use execution::{
    AttemptState, ChainOutcome, ErrorClass, ErrorCode, TierExecutionHandler, ValidationError,
};
pub use github::{GitHubClient, GitHubError};
pub use issues::{Issue, IssueType};
pub use orchestrator::{
    AutomationOptions, AutomationOutcome, Orchestrator, OrchestratorError, SystemStatus,
};
pub use providers::{
    AdminNotifier, CommandProvider, ImplementationProvider, ProviderError, ProviderOutcome, Vcs,
};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use tiers::{due_tiers, ScheduleLedger, SelectionOptions, SelectorError, TierSelection, TierSelector};
