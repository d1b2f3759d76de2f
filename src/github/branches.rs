use async_trait::async_trait;
use octocrab::models::repos::Object;
use octocrab::params::repos::Reference;
use tracing::info;

use super::client::GitHubClient;
use super::errors::GitHubError;
use crate::providers::{ProviderError, Vcs};

impl GitHubClient {
    pub async fn branch_exists_remote(&self, name: &str) -> Result<bool, GitHubError> {
        match self
            .octocrab()
            .repos(self.owner(), self.repo())
            .get_ref(&Reference::Branch(name.to_string()))
            .await
        {
            Ok(_) => Ok(true),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                Ok(false)
            }
            Err(e) => Err(GitHubError::Api(e)),
        }
    }

    pub async fn default_branch(&self) -> Result<String, GitHubError> {
        let repo = self
            .octocrab()
            .repos(self.owner(), self.repo())
            .get()
            .await?;
        Ok(repo.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    async fn head_sha(&self, branch: &str) -> Result<String, GitHubError> {
        let reference = self
            .octocrab()
            .repos(self.owner(), self.repo())
            .get_ref(&Reference::Branch(branch.to_string()))
            .await?;
        match reference.object {
            Object::Commit { sha, .. } => Ok(sha),
            Object::Tag { sha, .. } => Ok(sha),
            _ => Err(GitHubError::UnexpectedPayload(format!(
                "ref for '{branch}' does not point at a commit"
            ))),
        }
    }

    pub async fn create_branch_from_default(&self, name: &str) -> Result<(), GitHubError> {
        let base = self.default_branch().await?;
        let sha = self.head_sha(&base).await?;
        self.octocrab()
            .repos(self.owner(), self.repo())
            .create_ref(&Reference::Branch(name.to_string()), sha)
            .await?;
        info!(branch = name, base = %base, "Created branch");
        Ok(())
    }
}

#[async_trait]
impl Vcs for GitHubClient {
    async fn branch_exists(&self, name: &str) -> Result<bool, ProviderError> {
        if let Some(cached) = self.branch_cache.get(name).await {
            return Ok(cached);
        }
        self.throttle().await;
        let exists = self.branch_exists_remote(name).await.map_err(ProviderError::from)?;
        self.branch_cache.insert(name.to_string(), exists).await;
        Ok(exists)
    }

    async fn create_branch(&self, name: &str) -> Result<(), ProviderError> {
        self.throttle().await;
        self.create_branch_from_default(name)
            .await
            .map_err(ProviderError::from)?;
        self.branch_cache.insert(name.to_string(), true).await;
        Ok(())
    }

    async fn merge_branch(&self, name: &str) -> Result<(), ProviderError> {
        self.throttle().await;
        let base = self.default_branch().await.map_err(ProviderError::from)?;
        self.octocrab()
            .repos(self.owner(), self.repo())
            .merge(name, &base)
            .commit_message(format!("Merge automation branch '{name}'"))
            .send()
            .await
            .map_err(|e| ProviderError::from(GitHubError::Api(e)))?;
        info!(branch = name, base = %base, "Merged branch");
        Ok(())
    }

    async fn delete_branch(&self, name: &str) -> Result<(), ProviderError> {
        self.throttle().await;
        self.octocrab()
            .repos(self.owner(), self.repo())
            .delete_ref(&Reference::Branch(name.to_string()))
            .await
            .map_err(|e| ProviderError::from(GitHubError::Api(e)))?;
        self.branch_cache.insert(name.to_string(), false).await;
        info!(branch = name, "Deleted branch");
        Ok(())
    }
}
