use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::analytics::TierPerformance;
use crate::config::{AutomationConfig, TierConfig};
use crate::issues::{Issue, IssueType};

#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    /// Route to this tier regardless of scoring, as long as it is enabled
    pub force_tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSelection {
    pub tier: String,
    pub confidence: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectorError {
    #[error("no tier is enabled")]
    NoTierAvailable,
    #[error("forced tier '{0}' is not configured")]
    UnknownForcedTier(String),
    #[error("forced tier '{0}' is disabled")]
    ForcedTierDisabled(String),
}

/// How the issue at hand skews the scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bias {
    /// Favor the smallest adequate time budget (security / critical work)
    Urgent,
    /// Favor the largest time budget (refactors / complex work)
    Thorough,
    None,
}

// Weight of the budget-based bias relative to static priority. Large enough
// that a thorough issue reaches the biggest-budget tier across the default
// priority spread.
const BIAS_WEIGHT: f64 = 3.0;
// Multiplier applied when a tier's average latency overruns its budget
const LATENCY_PENALTY: f64 = 0.75;
// A tier with a known windowed success rate under this floor is not offered
// the urgency shortcut
const ADEQUACY_FLOOR: f64 = 0.5;

/// Pure scoring over a config + performance snapshot. No side effects; the
/// same inputs always select the same tier.
#[derive(Debug, Clone)]
pub struct TierSelector {
    automation: AutomationConfig,
}

impl TierSelector {
    pub fn new(automation: AutomationConfig) -> Self {
        Self { automation }
    }

    pub fn select(
        &self,
        tiers: &[TierConfig],
        performance: &HashMap<String, TierPerformance>,
        issue: &Issue,
        issue_type: IssueType,
        options: &SelectionOptions,
    ) -> Result<TierSelection, SelectorError> {
        if let Some(forced) = &options.force_tier {
            let tier = tiers
                .iter()
                .find(|t| &t.name == forced)
                .ok_or_else(|| SelectorError::UnknownForcedTier(forced.clone()))?;
            if !tier.enabled {
                return Err(SelectorError::ForcedTierDisabled(forced.clone()));
            }
            return Ok(TierSelection {
                tier: forced.clone(),
                confidence: 1.0,
            });
        }

        let ranked = self.rank(tiers, performance, issue, issue_type);
        ranked
            .into_iter()
            .next()
            .ok_or(SelectorError::NoTierAvailable)
    }

    /// All enabled tiers, best first, with normalized confidences. Reused by
    /// the analytics recommendation surface to preview routing.
    pub fn rank(
        &self,
        tiers: &[TierConfig],
        performance: &HashMap<String, TierPerformance>,
        issue: &Issue,
        issue_type: IssueType,
    ) -> Vec<TierSelection> {
        let enabled: Vec<&TierConfig> = tiers.iter().filter(|t| t.enabled).collect();
        if enabled.is_empty() {
            return Vec::new();
        }

        let bias = bias_for(issue, issue_type);
        let min_budget = enabled
            .iter()
            .map(|t| t.max_execution_time_ms)
            .min()
            .unwrap_or(1)
            .max(1);
        let max_budget = enabled
            .iter()
            .map(|t| t.max_execution_time_ms)
            .max()
            .unwrap_or(1)
            .max(1);

        let mut scored: Vec<(&TierConfig, f64)> = enabled
            .iter()
            .map(|tier| {
                let score = self.score_tier(
                    tier,
                    performance.get(&tier.name),
                    bias,
                    min_budget,
                    max_budget,
                );
                debug!(
                    tier.name = %tier.name,
                    tier.score = score,
                    issue.number = issue.number,
                    "Scored tier"
                );
                (*tier, score)
            })
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| match sb.total_cmp(sa) {
            // Ties: higher static priority, then lexicographically smallest name
            Ordering::Equal => match b.priority.cmp(&a.priority) {
                Ordering::Equal => a.name.cmp(&b.name),
                other => other,
            },
            other => other,
        });

        let total: f64 = scored.iter().map(|(_, s)| s.max(0.0)).sum();
        scored
            .into_iter()
            .map(|(tier, score)| TierSelection {
                tier: tier.name.clone(),
                confidence: if total > 0.0 {
                    (score / total).clamp(0.0, 1.0)
                } else {
                    0.0
                },
            })
            .collect()
    }

    fn score_tier(
        &self,
        tier: &TierConfig,
        performance: Option<&TierPerformance>,
        bias: Bias,
        min_budget: u64,
        max_budget: u64,
    ) -> f64 {
        // Static score from priority; clamped so penalties stay multiplicative
        let mut score = (tier.priority as f64).max(1.0);
        let mut windowed_rate = None;

        if let Some(perf) = performance.filter(|p| p.summary.execution_count > 0) {
            windowed_rate = Some(perf.summary.success_rate);

            if let Some(baseline) = perf.baseline_success_rate {
                let drop = (baseline - perf.summary.success_rate).max(0.0);
                score *= (1.0 - drop).max(0.1);
            }

            let ceiling =
                tier.max_execution_time_ms as f64 * self.automation.latency_overhead_factor;
            if perf.summary.average_execution_time_ms > ceiling {
                score *= LATENCY_PENALTY;
            }
        }

        let adequate = windowed_rate.map_or(true, |rate| rate >= ADEQUACY_FLOOR);
        let budget = tier.max_execution_time_ms.max(1) as f64;
        match bias {
            Bias::Urgent if adequate => {
                score *= 1.0 + BIAS_WEIGHT * (min_budget as f64 / budget);
            }
            Bias::Thorough => {
                score *= 1.0 + BIAS_WEIGHT * (budget / max_budget as f64);
            }
            _ => {}
        }

        score
    }
}

fn bias_for(issue: &Issue, issue_type: IssueType) -> Bias {
    if issue_type == IssueType::Security || issue.has_label("critical") {
        Bias::Urgent
    } else if issue_type == IssueType::Refactor || issue.has_label("complex") {
        Bias::Thorough
    } else {
        Bias::None
    }
}
