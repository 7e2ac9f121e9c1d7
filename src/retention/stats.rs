//! Statistics for prune executions.

use std::time::Duration;

/// Statistics from executing one prune plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Number of entries the plan asked to remove.
    pub planned: usize,

    /// Number of entries actually deleted.
    pub deleted: usize,

    /// Whether the run was a preview.
    pub dry_run: bool,

    /// Time spent deleting.
    pub duration: Duration,
}

impl PruneStats {
    pub fn new(planned: usize, dry_run: bool) -> Self {
        Self {
            planned,
            dry_run,
            ..Self::default()
        }
    }

    /// Record a successful deletion.
    pub fn record_deletion(&mut self) {
        self.deleted += 1;
    }

    /// Entries still present that the plan wanted gone.
    pub fn remaining(&self) -> usize {
        self.planned.saturating_sub(self.deleted)
    }

    pub fn summary(&self) -> String {
        format!(
            "Planned: {}, Deleted: {}, Dry run: {}, Duration: {:?}",
            self.planned, self.deleted, self.dry_run, self.duration
        )
    }
}
