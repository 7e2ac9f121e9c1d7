//! Snapshot retention.
//!
//! This module decides which timestamped snapshots to keep, given a rotation
//! policy such as `6,1h2d,1d2w`:
//! - keep the 6 newest snapshots unconditionally
//! - keep one snapshot per hour for snapshots up to 2 days old
//! - keep one snapshot per day for snapshots up to 2 weeks old
//!
//! # Overview
//!
//! Policies are parsed into a [`Schedule`] (memoized by [`ScheduleCache`]).
//! [`build_plan`] classifies raw names with a [`NameFormat`] and thins the
//! managed ones into a [`PrunePlan`]. [`Pruner`] runs the whole cycle against
//! any [`SnapshotOps`] backend: list, plan, delete.
//!
//! Names without the managed prefix or timestamp are reported as unmanaged
//! and never deleted. Snapshots dated after the reference time are always
//! kept and reported separately.
//!
//! # Example
//!
//! ```rust,ignore
//! use snapkeep::retention::{PruneOptions, Pruner};
//!
//! let pruner = Pruner::new();
//! let options = PruneOptions::default().with_dry_run(true);
//! let (plan, _stats) = pruner.prune(&backend, "6,1h2d,1d2w", &options)?;
//! println!("{}", plan.summary());
//! ```

mod cache;
mod naming;
mod ops;
mod plan;
mod schedule;
mod stats;
mod thin;

pub use cache::ScheduleCache;
pub use naming::{Entry, NameFormat};
pub use ops::{execute_plan, Pruner, SnapshotOps};
pub use plan::{build_plan, PruneOptions, PrunePlan};
pub use schedule::{parse_schedule, Rule, Schedule};
pub use stats::PruneStats;
pub use thin::thin;
