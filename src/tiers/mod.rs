// Tier selection and scheduling

pub mod schedule;
pub mod selector;

pub use schedule::{due_tiers, ScheduleLedger};
pub use selector::{SelectionOptions, SelectorError, TierSelection, TierSelector};
