//! Time-bucketed snapshot retention.
//!
//! Parses rotation policies, decides which timestamped snapshots to keep,
//! and executes the resulting prune plan through a caller-supplied backend.

pub mod clock;
pub mod config;
pub mod error;
pub mod retention;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BackendError, ConfigError, Error, PolicyError, Result};
pub use retention::{
    build_plan, parse_schedule, thin, Entry, NameFormat, PruneOptions, PrunePlan, PruneStats,
    Pruner, Rule, Schedule, ScheduleCache, SnapshotOps,
};
