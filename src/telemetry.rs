use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging. JSON output carries the correlation IDs
/// and span context needed to stitch one issue's chain back together.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    tracing::info!("Switchyard telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the records of one automation run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span carrying the common fields of one issue's automation run
pub fn automation_span(issue_number: u64, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "automation",
        issue.number = issue_number,
        correlation.id = correlation_id,
    )
}
