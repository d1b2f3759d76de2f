use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::info;

use super::{AnomalyKind, ExecutionRecord, PerformanceSummary, TierAnomaly, TierPerformance};
use crate::config::{AutomationConfig, TierConfig};
use crate::issues::{Issue, IssueType};
use crate::tiers::{TierSelection, TierSelector};

/// Per-tier state: the bounded FIFO window plus all-time counters that
/// survive eviction (the baseline the window is judged against).
#[derive(Debug, Default)]
struct TierWindow {
    records: VecDeque<ExecutionRecord>,
    lifetime_count: u64,
    lifetime_successes: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    windows: HashMap<String, TierWindow>,
    /// Most recent attempt per (tier, issue), for cooldown enforcement
    last_attempts: HashMap<(String, u64), DateTime<Utc>>,
}

/// Sole owner and writer of the execution record log. Appends are atomic
/// behind one lock; ordering across issues is unconstrained.
#[derive(Debug)]
pub struct PerformanceTracker {
    window_size: usize,
    state: Mutex<TrackerState>,
}

impl PerformanceTracker {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn from_config(config: &AutomationConfig) -> Self {
        Self::new(config.performance_window)
    }

    pub fn record_execution(&self, record: ExecutionRecord) {
        info!(
            tier.name = %record.tier,
            issue.number = record.issue_number,
            execution.success = record.success,
            execution.error_code = record.error_code.map(|c| c.as_str()),
            execution.duration_ms = record.duration_ms(),
            execution.fallback_from = record.fallback_from.as_deref(),
            correlation.id = %record.correlation_id,
            "Execution recorded"
        );

        let mut state = self.lock();
        state.last_attempts.insert(
            (record.tier.clone(), record.issue_number),
            record.started_at,
        );

        let window = state.windows.entry(record.tier.clone()).or_default();
        window.lifetime_count += 1;
        if record.success {
            window.lifetime_successes += 1;
        }
        window.records.push_back(record);
        while window.records.len() > self.window_size {
            window.records.pop_front();
        }
    }

    pub fn tier_summary(&self, tier: &str) -> PerformanceSummary {
        let state = self.lock();
        state
            .windows
            .get(tier)
            .map(|w| summarize(&w.records))
            .unwrap_or_default()
    }

    /// Snapshot of every tier's windowed summary and all-time baseline, for
    /// the selector's pure scoring pass.
    pub fn performance_snapshot(&self) -> HashMap<String, TierPerformance> {
        let state = self.lock();
        state
            .windows
            .iter()
            .map(|(tier, window)| {
                let baseline = if window.lifetime_count > 0 {
                    Some(window.lifetime_successes as f64 / window.lifetime_count as f64)
                } else {
                    None
                };
                (
                    tier.clone(),
                    TierPerformance {
                        summary: summarize(&window.records),
                        baseline_success_rate: baseline,
                    },
                )
            })
            .collect()
    }

    pub fn last_attempt_at(&self, tier: &str, issue_number: u64) -> Option<DateTime<Utc>> {
        let state = self.lock();
        state
            .last_attempts
            .get(&(tier.to_string(), issue_number))
            .copied()
    }

    /// Ranked routing preview for an issue, reusing the selector's scoring
    /// against the current snapshot. Nothing is executed or recorded.
    pub fn recommend_tiers(
        &self,
        selector: &TierSelector,
        tiers: &[TierConfig],
        issue: &Issue,
    ) -> Vec<TierSelection> {
        let issue_type = IssueType::classify(issue);
        selector.rank(tiers, &self.performance_snapshot(), issue, issue_type)
    }

    /// Flag tiers whose current window has diverged from their history:
    /// success rate too far under the all-time baseline, or average latency
    /// past the budget with overhead.
    pub fn detect_anomalies(
        &self,
        tiers: &[TierConfig],
        automation: &AutomationConfig,
    ) -> Vec<TierAnomaly> {
        let snapshot = self.performance_snapshot();
        let mut anomalies = Vec::new();

        for tier in tiers {
            let Some(perf) = snapshot.get(&tier.name) else {
                continue;
            };
            if perf.summary.execution_count == 0 {
                continue;
            }

            if let Some(baseline) = perf.baseline_success_rate {
                let current = perf.summary.success_rate;
                if baseline - current > automation.anomaly_success_drop {
                    anomalies.push(TierAnomaly {
                        tier: tier.name.clone(),
                        kind: AnomalyKind::SuccessRateDrop { baseline, current },
                    });
                }
            }

            let average_ms = perf.summary.average_execution_time_ms;
            let ceiling = tier.max_execution_time_ms as f64 * automation.latency_overhead_factor;
            if average_ms > ceiling {
                anomalies.push(TierAnomaly {
                    tier: tier.name.clone(),
                    kind: AnomalyKind::LatencyOverrun {
                        average_ms,
                        budget_ms: tier.max_execution_time_ms,
                    },
                });
            }
        }

        anomalies
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // Metrics are best-effort; a poisoned lock still holds usable state
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn summarize(records: &VecDeque<ExecutionRecord>) -> PerformanceSummary {
    if records.is_empty() {
        return PerformanceSummary::default();
    }

    let successes = records.iter().filter(|r| r.success).count();
    let latencies: Vec<u64> = records
        .iter()
        .filter(|r| !r.is_timeout())
        .map(|r| r.duration_ms())
        .collect();
    let average = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
    };

    PerformanceSummary {
        execution_count: records.len(),
        success_rate: successes as f64 / records.len() as f64,
        average_execution_time_ms: average,
    }
}
