use async_trait::async_trait;
use tracing::warn;

use super::client::GitHubClient;
use crate::execution::ErrorCode;
use crate::issues::Issue;
use crate::providers::{AdminNotifier, ProviderError};

/// Administrator notification as an issue comment, so critical failures
/// surface where the work item already lives.
#[async_trait]
impl AdminNotifier for GitHubClient {
    async fn notify_administrators(
        &self,
        tier: &str,
        issue: &Issue,
        error: ErrorCode,
    ) -> Result<(), ProviderError> {
        warn!(
            tier.name = tier,
            issue.number = issue.number,
            error.code = error.as_str(),
            "Escalating critical failure to administrators"
        );

        let body = format!(
            "🚨 **Automation halted on a critical error**\n\n\
             | | |\n|---|---|\n\
             | Tier | `{tier}` |\n\
             | Error | `{}` |\n\n\
             The fallback chain was aborted. cc @{}",
            error.as_str(),
            self.owner(),
        );

        self.throttle().await;
        self.octocrab()
            .issues(self.owner(), self.repo())
            .create_comment(issue.number, body)
            .await
            .map_err(|e| ProviderError::from(super::errors::GitHubError::Api(e)))?;
        Ok(())
    }
}
