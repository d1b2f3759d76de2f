use anyhow::Result;

use crate::cli::commands::build_orchestrator;
use crate::config::SwitchyardConfig;

pub struct StatusCommand {
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self) -> Result<()> {
        let config = SwitchyardConfig::load()?;
        let orchestrator = build_orchestrator(config)?;
        let status = orchestrator.system_status();

        if self.json {
            let tiers: serde_json::Map<String, serde_json::Value> = status
                .enabled_tiers
                .iter()
                .map(|name| {
                    let summary = orchestrator.tier_summary(name);
                    (name.clone(), serde_json::json!(summary))
                })
                .collect();
            let payload = serde_json::json!({
                "status": status,
                "tiers": tiers,
                "anomalies": orchestrator.detect_anomalies(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        println!("🚦 Switchyard status");
        println!();
        if status.config_validation.valid {
            println!("⚙️  Configuration: valid");
        } else {
            println!("⚙️  Configuration: INVALID");
            for problem in &status.config_validation.problems {
                println!("   → {problem}");
            }
        }

        println!();
        println!("📋 Enabled tiers:");
        for name in &status.enabled_tiers {
            let summary = orchestrator.tier_summary(name);
            if summary.execution_count == 0 {
                println!("   {name}: no recorded executions");
            } else {
                println!(
                    "   {name}: {} runs, {:.0}% success, {:.0}ms average",
                    summary.execution_count,
                    summary.success_rate * 100.0,
                    summary.average_execution_time_ms,
                );
            }
        }

        let anomalies = orchestrator.detect_anomalies();
        if !anomalies.is_empty() {
            println!();
            println!("⚠️  Anomalies:");
            for anomaly in &anomalies {
                println!("   {}: {:?}", anomaly.tier, anomaly.kind);
            }
        }
        Ok(())
    }
}
