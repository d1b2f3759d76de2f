use anyhow::Result;

use crate::cli::commands::build_orchestrator;
use crate::config::SwitchyardConfig;

pub struct BranchesCommand {
    pub issue: u64,
}

impl BranchesCommand {
    pub async fn execute(&self) -> Result<()> {
        let config = SwitchyardConfig::load()?;
        let orchestrator = build_orchestrator(config)?;

        println!("🌿 Candidate branches for issue #{}, in probe order:", self.issue);
        for name in orchestrator.detect_existing_branches(self.issue) {
            println!("   {name}");
        }
        Ok(())
    }
}
