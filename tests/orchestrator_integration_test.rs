use chrono::{Duration, Utc};
use std::sync::Arc;

use switchyard::config::SwitchyardConfig;
use switchyard::execution::ErrorCode;
use switchyard::issues::Issue;
use switchyard::orchestrator::{AutomationOptions, Orchestrator};
use switchyard::providers::fakes::{InMemoryVcs, PlannedCall, RecordingNotifier, ScriptedProvider};
use switchyard::tiers::SelectorError;

fn orchestrator_with(config: SwitchyardConfig, script: Vec<PlannedCall>) -> Orchestrator {
    Orchestrator::new(
        config,
        Arc::new(ScriptedProvider::new(script)),
        Arc::new(InMemoryVcs::new()),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn full_run_returns_branch_records_and_performance() {
    let orchestrator = orchestrator_with(SwitchyardConfig::default(), vec![]);
    let issue = Issue::new(
        55,
        "Fix crash when parsing empty config",
        "Stack trace attached",
        vec!["bug".to_string()],
    );

    let outcome = orchestrator
        .execute_automation_for_issue(&issue, &AutomationOptions::default())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.tier, "ultimate");
    assert_eq!(outcome.branch.name, "fix/issue-55");
    assert_eq!(outcome.branch.pattern, "fix/issue-{number}");
    assert_eq!(outcome.executions.len(), 1);
    assert!(!outcome.fallback_occurred);
    assert_eq!(outcome.performance.execution_count, 1);
}

#[tokio::test]
async fn fallback_surfaces_the_original_failing_tier() {
    let mut config = SwitchyardConfig::default();
    for tier in &mut config.tiers {
        tier.cooldown_minutes = 0;
    }
    let orchestrator = orchestrator_with(
        config,
        vec![
            PlannedCall::failure("TEMPORARY_API_ERROR"),
            PlannedCall::success(),
        ],
    );
    let issue = Issue::new(56, "Routine chore", "", vec![]);

    let outcome = orchestrator
        .execute_automation_for_issue(&issue, &AutomationOptions::default())
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.fallback_occurred);
    assert_eq!(outcome.tier, "rapid");
    assert_eq!(outcome.executions[0].tier, "ultimate");
    assert_eq!(
        outcome.executions[0].error_code,
        Some(ErrorCode::TemporaryApiError)
    );
    assert_eq!(
        outcome.executions[1].fallback_from.as_deref(),
        Some("ultimate")
    );
}

#[tokio::test]
async fn forced_disabled_tier_is_a_selector_error() {
    let mut config = SwitchyardConfig::default();
    config.tiers[2].enabled = false;
    let orchestrator = orchestrator_with(config, vec![]);
    let issue = Issue::new(57, "Anything", "", vec![]);

    let result = orchestrator
        .execute_automation_for_issue(
            &issue,
            &AutomationOptions {
                force_tier: Some("smart".to_string()),
            },
        )
        .await;

    match result {
        Err(switchyard::orchestrator::OrchestratorError::Selector(e)) => {
            assert_eq!(e, SelectorError::ForcedTierDisabled("smart".to_string()));
        }
        other => panic!("expected a selector error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_config_never_constructs_an_orchestrator() {
    let mut config = SwitchyardConfig::default();
    config.tiers[2].fallback_tier = Some("ultimate".to_string()); // cycle

    let result = Orchestrator::new(
        config,
        Arc::new(ScriptedProvider::always_succeeding()),
        Arc::new(InMemoryVcs::new()),
        Arc::new(RecordingNotifier::new()),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn system_status_reports_enabled_tiers_and_validation() {
    let mut config = SwitchyardConfig::default();
    config.tiers[1].enabled = false;
    let orchestrator = orchestrator_with(config, vec![]);

    let status = orchestrator.system_status();
    assert!(status.initialized);
    assert!(status.config_validation.valid);
    assert_eq!(
        status.enabled_tiers,
        vec!["ultimate".to_string(), "smart".to_string()]
    );
}

#[tokio::test]
async fn recommendation_ranks_without_executing() {
    let orchestrator = orchestrator_with(SwitchyardConfig::default(), vec![]);
    let issue = Issue::new(
        58,
        "Large-scale refactor of the storage layer",
        "",
        vec!["refactor".to_string(), "complex".to_string()],
    );

    let ranked = orchestrator.recommend_tiers(&issue);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].tier, "smart");
    // Preview only: nothing was recorded anywhere
    assert_eq!(orchestrator.tier_summary("smart").execution_count, 0);
}

#[tokio::test]
async fn tick_reports_due_periodic_tiers_only() {
    let orchestrator = orchestrator_with(SwitchyardConfig::default(), vec![]);
    let now = Utc::now();

    // Never ran: both periodic tiers are due; cron-scheduled smart is not
    assert_eq!(
        orchestrator.tick(now),
        vec!["ultimate".to_string(), "rapid".to_string()]
    );

    orchestrator.record_scheduled_run("ultimate", now);
    orchestrator.record_scheduled_run("rapid", now);
    assert!(orchestrator.tick(now).is_empty());

    // ultimate's 15-minute interval elapses first
    let later = now + Duration::minutes(20);
    assert_eq!(orchestrator.tick(later), vec!["ultimate".to_string()]);
}

#[tokio::test]
async fn monitoring_toggles_are_idempotent() {
    let orchestrator = orchestrator_with(SwitchyardConfig::default(), vec![]);
    assert!(!orchestrator.is_monitoring());

    orchestrator.start_monitoring();
    orchestrator.start_monitoring();
    assert!(orchestrator.is_monitoring());

    orchestrator.stop_monitoring();
    assert!(!orchestrator.is_monitoring());
    orchestrator.stop_monitoring();
}

#[tokio::test]
async fn concurrent_issues_each_get_their_own_chain() {
    let mut config = SwitchyardConfig::default();
    for tier in &mut config.tiers {
        tier.cooldown_minutes = 0;
    }
    let orchestrator = Arc::new(orchestrator_with(config, vec![]));

    let mut handles = Vec::new();
    for number in 1..=8u64 {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let issue = Issue::new(number, format!("Task {number}"), "", vec![]);
            orchestrator
                .execute_automation_for_issue(&issue, &AutomationOptions::default())
                .await
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.success);
    }
    // All eight runs landed in ultimate's window without lost appends
    assert_eq!(orchestrator.tier_summary("ultimate").execution_count, 8);
}
