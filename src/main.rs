use anyhow::Result;
use clap::Parser;

use switchyard::cli::commands::{
    branches::BranchesCommand, init::InitCommand, recommend::RecommendCommand, run::RunCommand,
    status::StatusCommand,
};
use switchyard::cli::{Cli, Commands};
use switchyard::config::SwitchyardConfig;
use switchyard::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    SwitchyardConfig::load_env_file()?;
    let observability = SwitchyardConfig::load()
        .map(|c| c.observability)
        .unwrap_or_default();
    init_telemetry(&observability)?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run { issue, tier }) => RunCommand::new(issue, tier).execute().await,
        Some(Commands::Status { json }) => StatusCommand { json }.execute().await,
        Some(Commands::Recommend { issue }) => RecommendCommand { issue }.execute().await,
        Some(Commands::Branches { issue }) => BranchesCommand { issue }.execute().await,
        Some(Commands::Init { force }) => InitCommand { force }.execute().await,
        None => {
            println!("🚦 Switchyard - tiered issue automation");
            println!();
            println!("  🚀 switchyard run --issue N       # Automate one issue");
            println!("  📊 switchyard status              # System and tier overview");
            println!("  🎯 switchyard recommend --issue N # Preview routing");
            println!("  🌿 switchyard branches --issue N  # Candidate branch names");
            println!("  ⚙️  switchyard init                # Write starter config");
            Ok(())
        }
    }
}
