use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::{sanitize, validate_new_branch_name, BranchError};
use crate::config::{BranchPatternConfig, PatternCondition};
use crate::issues::{Issue, IssueType};
use crate::providers::Vcs;

/// A generated branch identifier together with the template that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBranch {
    pub name: String,
    pub pattern: String,
}

/// Selects naming patterns and produces collision-free branch names.
/// Pure over its pattern table except for the remote-existence probes.
#[derive(Debug, Clone)]
pub struct BranchManager {
    /// Non-default patterns in ascending priority order, default last
    patterns: Vec<BranchPatternConfig>,
}

const COLLISION_RETRIES: u32 = 3;

impl BranchManager {
    /// The pattern table must already be validated (exactly one default,
    /// `{number}` present everywhere); see `SwitchyardConfig::validate`.
    pub fn new(mut patterns: Vec<BranchPatternConfig>) -> Self {
        patterns.sort_by_key(|p| (p.is_default, p.priority));
        Self { patterns }
    }

    /// First non-default pattern whose conditions all hold, else the default.
    pub fn select_pattern(&self, issue: &Issue, issue_type: IssueType) -> &BranchPatternConfig {
        self.patterns
            .iter()
            .find(|p| !p.is_default && p.conditions.iter().all(|c| condition_holds(c, issue, issue_type)))
            .or_else(|| self.patterns.iter().find(|p| p.is_default))
            .unwrap_or(&self.patterns[0])
    }

    /// Substitute the issue number and sanitize the result.
    pub fn render(&self, pattern: &BranchPatternConfig, issue_number: u64) -> String {
        sanitize(&pattern.template.replace("{number}", &issue_number.to_string()))
    }

    /// Every pattern's rendered name for this issue, in selection priority
    /// order, so callers can probe for a branch a human created manually.
    pub fn detect_existing_branches(&self, issue_number: u64) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            let name = self.render(pattern, issue_number);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Generate a name for a *new* branch: reserved names are rejected, and
    /// remote collisions are retried with a timestamp suffix before falling
    /// back to a constructed name that is unique by construction.
    pub async fn generate_branch_name(
        &self,
        issue: &Issue,
        issue_type: IssueType,
        vcs: &dyn Vcs,
    ) -> Result<NamedBranch, BranchError> {
        let pattern = self.select_pattern(issue, issue_type);
        let base = self.render(pattern, issue.number);
        validate_new_branch_name(&base)?;

        if !vcs.branch_exists(&base).await? {
            return Ok(NamedBranch {
                name: base,
                pattern: pattern.template.clone(),
            });
        }

        for attempt in 1..=COLLISION_RETRIES {
            let candidate = with_suffix(&base, unix_timestamp_ms());
            debug!(
                issue.number = issue.number,
                candidate = %candidate,
                attempt,
                "Branch name collided, retrying with timestamp suffix"
            );
            if !vcs.branch_exists(&candidate).await? {
                return Ok(NamedBranch {
                    name: candidate,
                    pattern: pattern.template.clone(),
                });
            }
        }

        // Unique by construction; always accepted without another probe
        let fallback = format!("claude-fallback-{}-{}", issue.number, unix_timestamp_ms());
        warn!(
            issue.number = issue.number,
            branch = %fallback,
            "Exhausted collision retries, using constructed fallback name"
        );
        Ok(NamedBranch {
            name: fallback,
            pattern: pattern.template.clone(),
        })
    }
}

fn condition_holds(condition: &PatternCondition, issue: &Issue, issue_type: IssueType) -> bool {
    match condition {
        PatternCondition::Label(label) => issue.has_label(label),
        PatternCondition::IssueType(t) => *t == issue_type,
    }
}

/// Append `-{ms}` while keeping the whole name within the 100-char cap.
fn with_suffix(base: &str, ms: u128) -> String {
    let suffix = format!("-{ms}");
    let keep = 100usize.saturating_sub(suffix.len());
    let head: String = base.chars().take(keep).collect();
    format!("{}{}", head.trim_end_matches(['-', '.']), suffix)
}

fn unix_timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchyardConfig;
    use crate::providers::fakes::InMemoryVcs;

    fn manager() -> BranchManager {
        BranchManager::new(SwitchyardConfig::default().branch_patterns)
    }

    #[test]
    fn test_default_pattern_when_nothing_matches() {
        let m = manager();
        let issue = Issue::new(7, "Investigate the thing", "", vec![]);
        let pattern = m.select_pattern(&issue, IssueType::General);
        assert!(pattern.is_default);
        assert_eq!(m.render(pattern, 7), "issue-7");
    }

    #[test]
    fn test_security_label_selects_security_pattern() {
        let m = manager();
        let issue = Issue::new(42, "Patch the hole", "", vec!["security".to_string()]);
        let pattern = m.select_pattern(&issue, IssueType::Security);
        assert_eq!(pattern.template, "security/issue-{number}");
        assert_eq!(m.render(pattern, 42), "security/issue-42");
    }

    #[test]
    fn test_detect_existing_branches_ordering() {
        let m = manager();
        let names = m.detect_existing_branches(5);
        assert_eq!(names.first().map(String::as_str), Some("security/issue-5"));
        assert_eq!(names.last().map(String::as_str), Some("issue-5"));
    }

    #[tokio::test]
    async fn test_no_collision_is_deterministic() {
        let m = manager();
        let vcs = InMemoryVcs::new();
        let issue = Issue::new(12, "Fix crash", "", vec!["bug".to_string()]);
        let a = m
            .generate_branch_name(&issue, IssueType::Bug, &vcs)
            .await
            .unwrap();
        let b = m
            .generate_branch_name(&issue, IssueType::Bug, &vcs)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "fix/issue-12");
    }

    #[tokio::test]
    async fn test_collision_appends_timestamp_suffix() {
        let m = manager();
        let vcs = InMemoryVcs::with_branches(&["fix/issue-42"]);
        let issue = Issue::new(42, "Fix crash", "", vec!["bug".to_string()]);
        let named = m
            .generate_branch_name(&issue, IssueType::Bug, &vcs)
            .await
            .unwrap();
        assert!(named.name.starts_with("fix/issue-42-"));
        let suffix = &named.name["fix/issue-42-".len()..];
        assert!(!suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_suffix_respects_length_cap() {
        let base = "x".repeat(100);
        let suffixed = with_suffix(&base, 1_700_000_000_000);
        assert!(suffixed.len() <= 100);
        assert!(suffixed.ends_with("-1700000000000"));
    }
}
