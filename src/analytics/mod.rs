// Performance analytics - execution records and derived tier summaries

pub mod tracker;

pub use tracker::PerformanceTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::execution::ErrorCode;

/// One tier attempt's outcome. Append-only and immutable once written;
/// every invocation of the execution handler produces exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub tier: String,
    pub issue_number: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub error_code: Option<ErrorCode>,
    pub branch_name: String,
    /// Tier this attempt fell back from, when it is part of a chain
    pub fallback_from: Option<String>,
    pub correlation_id: String,
}

impl ExecutionRecord {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    pub fn is_timeout(&self) -> bool {
        self.error_code == Some(ErrorCode::Timeout)
    }
}

/// Rolling-window view of one tier's recent outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub execution_count: usize,
    pub success_rate: f64,
    /// Computed over non-timeout records only, so the timeout ceiling never
    /// skews the average
    pub average_execution_time_ms: f64,
}

/// Windowed summary plus the all-time baseline the window is judged against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierPerformance {
    pub summary: PerformanceSummary,
    pub baseline_success_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAnomaly {
    pub tier: String,
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Windowed success rate has dropped too far below the all-time baseline
    SuccessRateDrop { baseline: f64, current: f64 },
    /// Average latency exceeds the tier budget by more than the overhead factor
    LatencyOverrun { average_ms: f64, budget_ms: u64 },
}
