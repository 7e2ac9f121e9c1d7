//! Snapshot backends and plan execution.

use std::sync::Arc;
use std::time::Instant;

use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock};
use crate::error::{BackendError, Error, Result};
use crate::retention::cache::ScheduleCache;
use crate::retention::plan::{build_plan, PruneOptions, PrunePlan};
use crate::retention::stats::PruneStats;

/// A stream of snapshots that can be listed and deleted.
///
/// Instance snapshots and volume snapshots are typical implementors.
/// `list` must return the complete set of names for the stream: a partial
/// list silently skews retention. `delete` should tolerate being retried.
pub trait SnapshotOps {
    /// Label used in logs and errors, e.g. `instance` or `volume`.
    fn kind(&self) -> &str;

    fn list(&self) -> std::result::Result<Vec<String>, BackendError>;

    fn delete(&self, name: &str) -> std::result::Result<(), BackendError>;
}

/// Delete every entry in `plan.remove` through `ops`, in order.
///
/// Stops at the first failure; deletions that already happened stay done and
/// the error reports how many there were. Returns without touching `ops` in
/// dry-run mode.
pub fn execute_plan<O>(ops: &O, plan: &PrunePlan, options: &PruneOptions) -> Result<PruneStats>
where
    O: SnapshotOps + ?Sized,
{
    let start = Instant::now();
    let mut stats = PruneStats::new(plan.remove.len(), options.dry_run);

    if options.dry_run {
        if !plan.remove.is_empty() {
            log::info!(
                "dry run: would remove {} {} snapshot(s)",
                plan.remove.len(),
                ops.kind()
            );
        }
        return Ok(stats);
    }

    for entry in &plan.remove {
        log::debug!("deleting {} snapshot {}", ops.kind(), entry.name);
        ops.delete(&entry.name).map_err(|source| Error::Delete {
            kind: ops.kind().to_string(),
            name: entry.name.clone(),
            deleted: stats.deleted,
            source,
        })?;
        stats.record_deletion();
    }

    stats.duration = start.elapsed();
    Ok(stats)
}

/// Plans and executes prunes with a shared schedule cache and clock.
#[derive(Clone)]
pub struct Pruner {
    cache: Arc<ScheduleCache>,
    clock: Arc<dyn Clock>,
}

impl Default for Pruner {
    fn default() -> Self {
        Self::new()
    }
}

impl Pruner {
    /// A pruner over the process-wide schedule cache and the wall clock.
    pub fn new() -> Self {
        Self {
            cache: ScheduleCache::shared(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ScheduleCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<ScheduleCache> {
        &self.cache
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Evaluate `policy` against `names` at the clock's current time.
    pub fn build_plan<S: AsRef<str>>(
        &self,
        names: &[S],
        policy: &str,
        options: &PruneOptions,
    ) -> Result<PrunePlan> {
        build_plan(names, policy, self.now(), options, &self.cache)
    }

    pub fn execute<O>(
        &self,
        ops: &O,
        plan: &PrunePlan,
        options: &PruneOptions,
    ) -> Result<PruneStats>
    where
        O: SnapshotOps + ?Sized,
    {
        execute_plan(ops, plan, options)
    }

    /// List once, plan, then execute.
    ///
    /// A list failure aborts before anything is planned or deleted.
    pub fn prune<O>(
        &self,
        ops: &O,
        policy: &str,
        options: &PruneOptions,
    ) -> Result<(PrunePlan, PruneStats)>
    where
        O: SnapshotOps + ?Sized,
    {
        let names = ops.list().map_err(|source| Error::List {
            kind: ops.kind().to_string(),
            source,
        })?;

        if policy.trim().is_empty() {
            log::info!(
                "retention disabled; keeping all managed {} snapshots",
                ops.kind()
            );
        }

        let plan = self.build_plan(&names, policy, options)?;

        // Logged before executing; a failed delete returns early.
        if !plan.future.is_empty() {
            log::warn!(
                "found {} {} snapshot(s) with timestamps in the future; keeping them",
                plan.future.len(),
                ops.kind()
            );
        }

        if plan.remove.is_empty() {
            log::debug!(
                "prune plan (no-op): kind={} policy={:?} dry_run={} keep={} unmanaged={}",
                ops.kind(),
                policy,
                options.dry_run,
                plan.keep.len(),
                plan.unmanaged.len()
            );
        } else {
            log::info!(
                "prune plan: kind={} policy={:?} dry_run={} keep={} remove={} unmanaged={}",
                ops.kind(),
                policy,
                options.dry_run,
                plan.keep.len(),
                plan.remove.len(),
                plan.unmanaged.len()
            );
        }

        let stats = self.execute(ops, &plan, options)?;
        log::debug!("{} prune finished: {}", ops.kind(), stats.summary());

        Ok((plan, stats))
    }
}
