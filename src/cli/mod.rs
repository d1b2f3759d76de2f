use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Issue automation through tiered processing strategies")]
#[command(long_about = "Switchyard routes issues through processing tiers that trade speed \
                       against thoroughness, with collision-safe branch naming, bounded \
                       fallback chains and performance-driven tier selection.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run automation for a single issue
    Run {
        /// Issue number to automate
        #[arg(long)]
        issue: u64,
        /// Force a specific tier instead of letting the selector score
        #[arg(long, help = "Tier name to force; must be enabled")]
        tier: Option<String>,
    },
    /// Display system status and per-tier performance
    Status {
        /// Emit machine-readable JSON instead of the console report
        #[arg(long)]
        json: bool,
    },
    /// Preview tier routing for an issue without executing
    Recommend {
        /// Issue number to evaluate
        #[arg(long)]
        issue: u64,
    },
    /// List candidate branch names for an issue, in probe order
    Branches {
        /// Issue number to render patterns for
        #[arg(long)]
        issue: u64,
    },
    /// Write a starter switchyard.toml
    Init {
        /// Overwrite an existing switchyard.toml
        #[arg(long, help = "Overwrite existing configuration")]
        force: bool,
    },
}
