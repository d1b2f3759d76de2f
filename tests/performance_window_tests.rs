use chrono::{Duration, Utc};

use switchyard::analytics::{ExecutionRecord, PerformanceTracker};
use switchyard::config::{AutomationConfig, SwitchyardConfig};
use switchyard::execution::ErrorCode;

fn record(tier: &str, issue: u64, success: bool, duration_ms: i64, error: Option<ErrorCode>) -> ExecutionRecord {
    let started = Utc::now();
    ExecutionRecord {
        tier: tier.to_string(),
        issue_number: issue,
        started_at: started,
        finished_at: started + Duration::milliseconds(duration_ms),
        success,
        error_code: error,
        branch_name: format!("issue-{issue}"),
        fallback_from: None,
        correlation_id: "window-test".to_string(),
    }
}

#[test]
fn execution_count_never_exceeds_the_window_size() {
    let tracker = PerformanceTracker::new(100);
    for i in 0..250 {
        tracker.record_execution(record("rapid", i, true, 50, None));
    }
    let summary = tracker.tier_summary("rapid");
    assert_eq!(summary.execution_count, 100);
}

#[test]
fn execution_count_equals_retained_records_below_the_cap() {
    let tracker = PerformanceTracker::new(100);
    for i in 0..37 {
        tracker.record_execution(record("rapid", i, i % 2 == 0, 50, None));
    }
    let summary = tracker.tier_summary("rapid");
    assert_eq!(summary.execution_count, 37);
}

#[test]
fn eviction_is_oldest_first() {
    let tracker = PerformanceTracker::new(3);
    // Three failures, then three successes: the failures age out
    for i in 0..3 {
        tracker.record_execution(record("rapid", i, false, 50, Some(ErrorCode::TemporaryApiError)));
    }
    for i in 3..6 {
        tracker.record_execution(record("rapid", i, true, 50, None));
    }
    let summary = tracker.tier_summary("rapid");
    assert_eq!(summary.execution_count, 3);
    assert_eq!(summary.success_rate, 1.0);
}

#[test]
fn windows_are_tracked_per_tier() {
    let tracker = PerformanceTracker::new(10);
    tracker.record_execution(record("ultimate", 1, true, 10, None));
    tracker.record_execution(record("rapid", 1, false, 10, Some(ErrorCode::TemporaryApiError)));

    assert_eq!(tracker.tier_summary("ultimate").success_rate, 1.0);
    assert_eq!(tracker.tier_summary("rapid").success_rate, 0.0);
    assert_eq!(tracker.tier_summary("smart").execution_count, 0);
}

#[test]
fn timeouts_count_against_success_but_not_latency() {
    let tracker = PerformanceTracker::new(10);
    tracker.record_execution(record("smart", 1, true, 1_000, None));
    tracker.record_execution(record("smart", 2, false, 900_000, Some(ErrorCode::Timeout)));

    let summary = tracker.tier_summary("smart");
    assert_eq!(summary.execution_count, 2);
    assert_eq!(summary.success_rate, 0.5);
    // The 900s timeout ceiling must not leak into the average
    assert!((summary.average_execution_time_ms - 1_000.0).abs() < 1e-9);
}

#[test]
fn baseline_outlives_window_eviction() {
    let tracker = PerformanceTracker::new(10);
    // 40 successes roll through a 10-slot window
    for i in 0..40 {
        tracker.record_execution(record("rapid", i, true, 50, None));
    }
    // Then 10 failures fill the window entirely
    for i in 40..50 {
        tracker.record_execution(record("rapid", i, false, 50, Some(ErrorCode::TemporaryApiError)));
    }

    let snapshot = tracker.performance_snapshot();
    let perf = &snapshot["rapid"];
    assert_eq!(perf.summary.success_rate, 0.0);
    // Lifetime: 40 of 50 succeeded, eviction notwithstanding
    let baseline = perf.baseline_success_rate.unwrap();
    assert!((baseline - 0.8).abs() < 1e-9);

    // And that divergence is exactly what anomaly detection flags
    let config = SwitchyardConfig::default();
    let anomalies = tracker.detect_anomalies(&config.tiers, &AutomationConfig::default());
    assert!(anomalies.iter().any(|a| a.tier == "rapid"));
}
