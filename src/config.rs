use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::issues::IssueType;

/// Main configuration structure for Switchyard
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Orchestration core settings
    pub automation: AutomationConfig,
    /// External implementation provider settings
    pub provider: ProviderConfig,
    /// Processing tier table
    pub tiers: Vec<TierConfig>,
    /// Branch naming pattern table
    pub branch_patterns: Vec<BranchPatternConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second against the API
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level directive when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON-structured log lines instead of plain text
    pub json_logs: bool,
}

/// Knobs for the orchestration core. Thresholds live here so none of them
/// are hard-coded in scoring or anomaly logic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Maximum fallback-chain depth per issue
    pub max_fallback_depth: u32,
    /// A tier's average latency may exceed its budget by this factor before
    /// it is penalized / flagged
    pub latency_overhead_factor: f64,
    /// Success-rate drop below the all-time baseline (absolute) that flags a
    /// tier as anomalous
    pub anomaly_success_drop: f64,
    /// Rolling window size per tier for performance summaries
    pub performance_window: usize,
    /// Interval between background anomaly sweeps
    pub monitor_interval_seconds: u64,
}

/// External command invoked to implement an issue on a branch.
/// `{issue}`, `{branch}` and `{tier}` placeholders are substituted per run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub command: String,
    pub args: Vec<String>,
}

/// One processing tier: a named strategy with a time budget, a priority and
/// an optional fallback target. Loaded once per orchestration cycle and
/// immutable during execution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TierConfig {
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub schedule: ScheduleKind,
    pub max_execution_time_ms: u64,
    pub priority: i64,
    #[serde(default)]
    pub fallback_tier: Option<String>,
    #[serde(default)]
    pub cooldown_minutes: u64,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    /// Observed target success rate for this tier; configurable, not load-bearing
    #[serde(default = "default_target_success_rate")]
    pub target_success_rate: f64,
}

fn default_target_success_rate() -> f64 {
    0.9
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleKind {
    Periodic {
        interval_minutes: u64,
    },
    /// Opaque cron expression; parsed and triggered by external CI, never here
    Cron {
        expr: String,
    },
    #[default]
    Manual,
}

/// Accounting caps enforced by the caller of this core, not by the core itself
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceLimits {
    pub cpu: u32,
    pub memory_mb: u64,
    pub api_calls: u64,
}

/// One branch naming pattern: a template with a single `{number}`
/// placeholder plus the conditions under which it applies.
/// Lower priority value = more specific, evaluated first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BranchPatternConfig {
    pub template: String,
    pub priority: u32,
    #[serde(default)]
    pub conditions: Vec<PatternCondition>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PatternCondition {
    /// Issue carries this label (case-insensitive)
    Label(String),
    /// Issue classified as this type
    IssueType(IssueType),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("duplicate tier name '{0}'")]
    DuplicateTier(String),
    #[error("tier '{tier}' has non-positive execution time budget")]
    InvalidTimeBudget { tier: String },
    #[error("tier '{tier}' falls back to unknown tier '{fallback}'")]
    UnknownFallback { tier: String, fallback: String },
    #[error("fallback chain starting at tier '{tier}' contains a cycle")]
    CyclicFallback { tier: String },
    #[error("no branch pattern is marked as default")]
    NoDefaultPattern,
    #[error("more than one branch pattern is marked as default")]
    MultipleDefaultPatterns,
    #[error("the default branch pattern must not carry conditions")]
    DefaultPatternHasConditions,
    #[error("branch pattern '{template}' is missing the {{number}} placeholder")]
    MissingNumberPlaceholder { template: String },
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None, // Read from env at load time
            owner: String::new(),
            repo: String::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1,
            burst_capacity: 10,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            max_fallback_depth: 3,
            latency_overhead_factor: 1.2,
            anomaly_success_drop: 0.15,
            performance_window: 100,
            monitor_interval_seconds: 300,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec![
                "--issue".to_string(),
                "{issue}".to_string(),
                "--branch".to_string(),
                "{branch}".to_string(),
                "--tier".to_string(),
                "{tier}".to_string(),
            ],
        }
    }
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            observability: ObservabilityConfig::default(),
            automation: AutomationConfig::default(),
            provider: ProviderConfig::default(),
            tiers: vec![
                TierConfig {
                    name: "ultimate".to_string(),
                    enabled: true,
                    schedule: ScheduleKind::Periodic {
                        interval_minutes: 15,
                    },
                    max_execution_time_ms: 45_000,
                    priority: 300,
                    fallback_tier: Some("rapid".to_string()),
                    cooldown_minutes: 5,
                    resource_limits: ResourceLimits {
                        cpu: 1,
                        memory_mb: 512,
                        api_calls: 50,
                    },
                    target_success_rate: 0.90,
                },
                TierConfig {
                    name: "rapid".to_string(),
                    enabled: true,
                    schedule: ScheduleKind::Periodic {
                        interval_minutes: 60,
                    },
                    max_execution_time_ms: 240_000,
                    priority: 200,
                    fallback_tier: Some("smart".to_string()),
                    cooldown_minutes: 15,
                    resource_limits: ResourceLimits {
                        cpu: 2,
                        memory_mb: 1024,
                        api_calls: 200,
                    },
                    target_success_rate: 0.85,
                },
                TierConfig {
                    name: "smart".to_string(),
                    enabled: true,
                    schedule: ScheduleKind::Cron {
                        expr: "0 */4 * * *".to_string(),
                    },
                    max_execution_time_ms: 900_000,
                    priority: 100,
                    fallback_tier: None,
                    cooldown_minutes: 60,
                    resource_limits: ResourceLimits {
                        cpu: 4,
                        memory_mb: 2048,
                        api_calls: 1000,
                    },
                    target_success_rate: 0.93,
                },
            ],
            branch_patterns: vec![
                BranchPatternConfig {
                    template: "security/issue-{number}".to_string(),
                    priority: 1,
                    conditions: vec![PatternCondition::Label("security".to_string())],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "fix/issue-{number}".to_string(),
                    priority: 2,
                    conditions: vec![PatternCondition::IssueType(IssueType::Bug)],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "feature/issue-{number}".to_string(),
                    priority: 3,
                    conditions: vec![PatternCondition::IssueType(IssueType::Feature)],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "refactor/issue-{number}".to_string(),
                    priority: 4,
                    conditions: vec![PatternCondition::IssueType(IssueType::Refactor)],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "docs/issue-{number}".to_string(),
                    priority: 5,
                    conditions: vec![PatternCondition::IssueType(IssueType::Docs)],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "perf/issue-{number}".to_string(),
                    priority: 6,
                    conditions: vec![PatternCondition::IssueType(IssueType::Performance)],
                    is_default: false,
                },
                BranchPatternConfig {
                    template: "issue-{number}".to_string(),
                    priority: 10,
                    conditions: vec![],
                    is_default: true,
                },
            ],
        }
    }
}

impl SwitchyardConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. switchyard.toml in the working directory
    /// 3. Environment variables (prefixed with SWITCHYARD_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("switchyard.toml").exists() {
            builder = builder.add_source(File::with_name("switchyard"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SWITCHYARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut loaded: SwitchyardConfig = config.try_deserialize()?;

        // GitHub token can come from several places
        if loaded.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                loaded.github.token = Some(token);
            } else if let Ok(token) = std::env::var("SWITCHYARD_GITHUB_TOKEN") {
                loaded.github.token = Some(token);
            }
        }

        Ok(loaded)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn tier(&self, name: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn enabled_tiers(&self) -> impl Iterator<Item = &TierConfig> {
        self.tiers.iter().filter(|t| t.enabled)
    }

    /// Validate the tier and pattern tables. Runs at orchestrator
    /// construction so a bad config never reaches an execution attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.name.as_str()) {
                return Err(ConfigError::DuplicateTier(tier.name.clone()));
            }
            if tier.max_execution_time_ms == 0 {
                return Err(ConfigError::InvalidTimeBudget {
                    tier: tier.name.clone(),
                });
            }
            if let Some(fallback) = &tier.fallback_tier {
                if self.tier(fallback).is_none() {
                    return Err(ConfigError::UnknownFallback {
                        tier: tier.name.clone(),
                        fallback: fallback.clone(),
                    });
                }
            }
        }

        // Every fallback chain must terminate in a tier without a fallback
        for tier in &self.tiers {
            let mut visited = HashSet::new();
            let mut current = tier;
            visited.insert(current.name.as_str());
            while let Some(next_name) = &current.fallback_tier {
                match self.tier(next_name) {
                    Some(next) if visited.insert(next.name.as_str()) => current = next,
                    Some(_) => {
                        return Err(ConfigError::CyclicFallback {
                            tier: tier.name.clone(),
                        })
                    }
                    None => break, // already reported above
                }
            }
        }

        let defaults: Vec<_> = self.branch_patterns.iter().filter(|p| p.is_default).collect();
        match defaults.len() {
            0 => return Err(ConfigError::NoDefaultPattern),
            1 => {
                if !defaults[0].conditions.is_empty() {
                    return Err(ConfigError::DefaultPatternHasConditions);
                }
            }
            _ => return Err(ConfigError::MultipleDefaultPatterns),
        }

        for pattern in &self.branch_patterns {
            if !pattern.template.contains("{number}") {
                return Err(ConfigError::MissingNumberPlaceholder {
                    template: pattern.template.clone(),
                });
            }
        }

        Ok(())
    }
}
