use anyhow::Result;

use crate::cli::commands::build_orchestrator;
use crate::config::SwitchyardConfig;
use crate::github::GitHubClient;
use crate::orchestrator::AutomationOptions;

pub struct RunCommand {
    pub issue: u64,
    pub tier: Option<String>,
}

impl RunCommand {
    pub fn new(issue: u64, tier: Option<String>) -> Self {
        Self { issue, tier }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = SwitchyardConfig::load()?;
        let github = GitHubClient::new(&config.github)?;

        println!("🔄 Fetching issue #{}...", self.issue);
        let issue = github.fetch_issue(self.issue).await?;
        println!("   {}", issue.title);

        let orchestrator = build_orchestrator(config)?;
        let options = AutomationOptions {
            force_tier: self.tier.clone(),
        };

        println!("🚦 Routing issue #{} through automation...", self.issue);
        let outcome = orchestrator
            .execute_automation_for_issue(&issue, &options)
            .await?;

        println!();
        if outcome.success {
            println!("✅ Automation succeeded on tier '{}'", outcome.tier);
        } else if outcome.critical_abort {
            println!(
                "🚨 Automation aborted on tier '{}' after a critical error; administrators notified",
                outcome.tier
            );
        } else {
            println!(
                "❌ Automation failed; fallback chain ended on tier '{}'",
                outcome.tier
            );
        }
        println!("🌿 Branch: {} (pattern: {})", outcome.branch.name, outcome.branch.pattern);

        println!();
        println!("📋 Attempts:");
        for record in &outcome.executions {
            let status = if record.success { "✅" } else { "❌" };
            let detail = record
                .error_code
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| format!("{}ms", record.duration_ms()));
            match &record.fallback_from {
                Some(from) => println!("   {status} {} ({detail}) ← fell back from {from}", record.tier),
                None => println!("   {status} {} ({detail})", record.tier),
            }
        }

        println!();
        println!(
            "📊 Tier '{}' window: {} runs, {:.0}% success, {:.0}ms average",
            outcome.tier,
            outcome.performance.execution_count,
            outcome.performance.success_rate * 100.0,
            outcome.performance.average_execution_time_ms,
        );
        Ok(())
    }
}
