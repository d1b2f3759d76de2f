//! Pure schedule decisions for periodic tiers.
//!
//! The core never owns a timer: callers (CI, an external scheduler, a manual
//! invocation) ask "which tiers are due at `now`" and do the triggering
//! themselves. Cron-scheduled tiers are carried as opaque expressions and
//! fired by external CI; manual tiers are never due.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::config::{ScheduleKind, TierConfig};

/// Last-run bookkeeping per tier. Owned by the orchestrator, fed by callers
/// whenever a scheduled cycle actually runs.
#[derive(Debug, Default)]
pub struct ScheduleLedger {
    last_run: HashMap<String, DateTime<Utc>>,
}

impl ScheduleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&mut self, tier: &str, at: DateTime<Utc>) {
        self.last_run.insert(tier.to_string(), at);
    }

    pub fn last_run(&self, tier: &str) -> Option<DateTime<Utc>> {
        self.last_run.get(tier).copied()
    }
}

/// Periodic tiers whose interval has elapsed at `now`, in config order.
/// A tier that never ran is immediately due.
pub fn due_tiers(
    tiers: &[TierConfig],
    ledger: &ScheduleLedger,
    now: DateTime<Utc>,
) -> Vec<String> {
    tiers
        .iter()
        .filter(|tier| tier.enabled)
        .filter(|tier| match &tier.schedule {
            ScheduleKind::Periodic { interval_minutes } => match ledger.last_run(&tier.name) {
                Some(last) => now - last >= Duration::minutes(*interval_minutes as i64),
                None => true,
            },
            ScheduleKind::Cron { .. } | ScheduleKind::Manual => false,
        })
        .map(|tier| tier.name.clone())
        .collect()
}
