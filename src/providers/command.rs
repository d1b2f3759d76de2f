//! Command-backed implementation provider
//!
//! Runs a configurable external command (an agent CLI) per issue, with
//! `{issue}`, `{branch}` and `{tier}` placeholders substituted into its
//! arguments. The execution handler owns the time budget; this provider just
//! runs the process to completion and reports what it saw.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ImplementationProvider, ProviderError, ProviderOutcome};
use crate::config::{ProviderConfig, TierConfig};
use crate::execution::ErrorCode;
use crate::issues::Issue;

pub struct CommandProvider {
    config: ProviderConfig,
}

impl CommandProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn render_args(&self, issue: &Issue, branch_name: &str, tier: &TierConfig) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{issue}", &issue.number.to_string())
                    .replace("{branch}", branch_name)
                    .replace("{tier}", &tier.name)
            })
            .collect()
    }
}

#[async_trait]
impl ImplementationProvider for CommandProvider {
    async fn execute(
        &self,
        issue: &Issue,
        branch_name: &str,
        tier: &TierConfig,
    ) -> Result<ProviderOutcome, ProviderError> {
        let args = self.render_args(issue, branch_name, tier);
        debug!(
            provider.command = %self.config.command,
            issue.number = issue.number,
            branch = branch_name,
            "Spawning implementation provider"
        );

        let output = Command::new(&self.config.command)
            .args(&args)
            .env("SWITCHYARD_ISSUE", issue.number.to_string())
            .env("SWITCHYARD_BRANCH", branch_name)
            .env("SWITCHYARD_TIER", &tier.name)
            .output()
            .await
            .map_err(|e| {
                let code = if e.kind() == std::io::ErrorKind::NotFound {
                    ErrorCode::SystemFailure
                } else {
                    ErrorCode::TemporaryApiError
                };
                ProviderError::new(code, format!("failed to spawn '{}': {}", self.config.command, e))
            })?;

        if output.status.success() {
            // The last non-empty stdout line, when present, names the artifact
            let artifact_ref = String::from_utf8_lossy(&output.stdout)
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string());
            Ok(ProviderOutcome::succeeded(artifact_ref))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                issue.number = issue.number,
                exit_code = output.status.code(),
                "Implementation provider reported failure"
            );
            // Providers signal a specific code via their last stderr line
            let code = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .filter(|l| l.chars().all(|c| c.is_ascii_uppercase() || c == '_'))
                .unwrap_or("IMPLEMENTATION_FAILED");
            Ok(ProviderOutcome::failed(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchyardConfig;

    fn tier() -> TierConfig {
        SwitchyardConfig::default().tiers[0].clone()
    }

    #[test]
    fn test_placeholder_substitution() {
        let provider = CommandProvider::new(ProviderConfig {
            command: "agent".to_string(),
            args: vec!["--issue".into(), "{issue}".into(), "{branch}".into()],
        });
        let issue = Issue::new(42, "title", "", vec![]);
        let args = provider.render_args(&issue, "fix/issue-42", &tier());
        assert_eq!(args, vec!["--issue", "42", "fix/issue-42"]);
    }

    #[tokio::test]
    async fn test_successful_command_reports_artifact() {
        let provider = CommandProvider::new(ProviderConfig {
            command: "sh".to_string(),
            args: vec!["-c".into(), "echo sha-abc123".into()],
        });
        let issue = Issue::new(1, "t", "", vec![]);
        let outcome = provider.execute(&issue, "issue-1", &tier()).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.artifact_ref.as_deref(), Some("sha-abc123"));
    }

    #[tokio::test]
    async fn test_failing_command_surfaces_code_from_stderr() {
        let provider = CommandProvider::new(ProviderConfig {
            command: "sh".to_string(),
            args: vec!["-c".into(), "echo RATE_LIMIT_EXCEEDED >&2; exit 1".into()],
        });
        let issue = Issue::new(1, "t", "", vec![]);
        let outcome = provider.execute(&issue, "issue-1", &tier()).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error_code.as_deref(), Some("RATE_LIMIT_EXCEEDED"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_system_failure() {
        let provider = CommandProvider::new(ProviderConfig {
            command: "definitely-not-a-real-binary-xyz".to_string(),
            args: vec![],
        });
        let issue = Issue::new(1, "t", "", vec![]);
        let err = provider
            .execute(&issue, "issue-1", &tier())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SystemFailure);
    }
}
