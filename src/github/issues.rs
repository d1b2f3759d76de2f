use super::client::GitHubClient;
use super::errors::GitHubError;
use crate::issues::Issue;

impl GitHubClient {
    /// Fetch a specific issue by number
    pub async fn fetch_issue(&self, issue_number: u64) -> Result<Issue, GitHubError> {
        self.throttle().await;
        let issue = self
            .octocrab()
            .issues(self.owner(), self.repo())
            .get(issue_number)
            .await?;

        Ok(Issue {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        })
    }
}
