use anyhow::Result;
use std::sync::Arc;

use crate::config::SwitchyardConfig;
use crate::github::GitHubClient;
use crate::orchestrator::Orchestrator;
use crate::providers::CommandProvider;

pub mod branches;
pub mod init;
pub mod recommend;
pub mod run;
pub mod status;

/// Build a fully wired orchestrator against GitHub-backed collaborators.
pub fn build_orchestrator(config: SwitchyardConfig) -> Result<Orchestrator> {
    let github = Arc::new(GitHubClient::new(&config.github)?);
    let provider = Arc::new(CommandProvider::new(config.provider.clone()));
    let orchestrator = Orchestrator::new(config, provider, github.clone(), github)?;
    Ok(orchestrator)
}
