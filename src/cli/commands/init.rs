use anyhow::Result;
use std::path::Path;

use crate::config::SwitchyardConfig;

pub struct InitCommand {
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let path = Path::new("switchyard.toml");
        if path.exists() && !self.force {
            println!("⚠️  switchyard.toml already exists (use --force to overwrite)");
            return Ok(());
        }

        let config = SwitchyardConfig::default();
        config.save_to_file(path)?;
        println!("✅ Wrote starter configuration to switchyard.toml");
        println!("   → Set github.owner and github.repo, then export GITHUB_TOKEN");
        println!("   → Try: switchyard status");
        Ok(())
    }
}
