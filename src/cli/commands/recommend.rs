use anyhow::Result;

use crate::cli::commands::build_orchestrator;
use crate::config::SwitchyardConfig;
use crate::github::GitHubClient;

pub struct RecommendCommand {
    pub issue: u64,
}

impl RecommendCommand {
    pub async fn execute(&self) -> Result<()> {
        let config = SwitchyardConfig::load()?;
        let github = GitHubClient::new(&config.github)?;
        let issue = github.fetch_issue(self.issue).await?;
        let orchestrator = build_orchestrator(config)?;

        println!("🎯 Tier ranking for issue #{}: {}", issue.number, issue.title);
        println!();
        let ranked = orchestrator.recommend_tiers(&issue);
        if ranked.is_empty() {
            println!("   No tier is enabled");
            return Ok(());
        }
        for (i, selection) in ranked.iter().enumerate() {
            println!(
                "   {}. {} (confidence {:.2})",
                i + 1,
                selection.tier,
                selection.confidence
            );
        }
        Ok(())
    }
}
