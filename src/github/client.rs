use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use octocrab::Octocrab;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::errors::GitHubError;
use crate::config::GitHubConfig;

/// Rate-limited GitHub client. Wraps Octocrab with a governor quota sized
/// for the authenticated API allowance and a short-lived cache for branch
/// existence probes, which name generation hits repeatedly.
#[derive(Debug)]
pub struct GitHubClient {
    octocrab: Octocrab,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    pub(super) branch_cache: Cache<String, bool>,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .ok_or_else(|| {
                GitHubError::TokenNotFound(
                    "set github.token in switchyard.toml or export GITHUB_TOKEN".to_string(),
                )
            })?;
        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(GitHubError::RepoNotConfigured(
                "set github.owner and github.repo".to_string(),
            ));
        }

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let burst =
            NonZeroU32::new(config.rate_limit.burst_capacity.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let octocrab = Octocrab::builder().personal_token(token).build()?;

        // Branch existence goes stale fast; keep the cache short-lived
        let branch_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(30))
            .build();

        Ok(Self {
            octocrab,
            rate_limiter,
            branch_cache,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// Wait for rate limit headroom before touching the API
    pub(super) async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;
        debug!("GitHub API slot acquired");
    }

    pub fn octocrab(&self) -> &Octocrab {
        &self.octocrab
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}
