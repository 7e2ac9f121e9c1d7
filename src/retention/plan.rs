//! Prune planning: classify names, then thin the managed ones.

use std::collections::HashSet;

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::retention::cache::ScheduleCache;
use crate::retention::naming::{Entry, NameFormat};
use crate::retention::thin::thin;

/// Options for building and executing a prune.
#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    /// Compute the plan but never delete.
    pub dry_run: bool,
    /// Names that are always kept, whatever the schedule says.
    pub pinned: HashSet<String>,
    /// How managed names are recognized.
    pub format: NameFormat,
    /// Fail instead of keeping entries dated after the reference time.
    pub reject_future: bool,
}

impl PruneOptions {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_format(mut self, format: NameFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_reject_future(mut self, reject_future: bool) -> Self {
        self.reject_future = reject_future;
        self
    }

    pub fn pin(mut self, name: impl Into<String>) -> Self {
        self.pinned.insert(name.into());
        self
    }
}

/// Outcome of evaluating one policy against one list of names.
///
/// `keep` and `remove` partition the managed entries. `future` is the subset
/// of `keep` dated after the reference time. `unmanaged` holds names without
/// the prefix or without a parseable timestamp; they are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrunePlan {
    pub keep: Vec<Entry>,
    pub remove: Vec<Entry>,
    pub unmanaged: Vec<String>,
    pub future: Vec<Entry>,
    pub policy: String,
}

impl PrunePlan {
    /// Number of entries that carried a valid prefix and timestamp.
    pub fn managed_count(&self) -> usize {
        self.keep.len() + self.remove.len()
    }

    /// True when executing the plan would delete nothing.
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Keep: {}, Remove: {}, Unmanaged: {}, Future: {}",
            self.keep.len(),
            self.remove.len(),
            self.unmanaged.len(),
            self.future.len()
        )
    }
}

/// Evaluate `policy` against `names` at reference time `now`.
///
/// A blank policy, or one that parses to no rules and no always-keep count,
/// keeps every managed entry. With `reject_future` set, any managed entry
/// dated after `now` fails the whole plan.
pub fn build_plan<S: AsRef<str>>(
    names: &[S],
    policy: &str,
    now: OffsetDateTime,
    options: &PruneOptions,
    cache: &ScheduleCache,
) -> Result<PrunePlan> {
    let schedule = if policy.trim().is_empty() {
        None
    } else {
        Some(cache.get_or_parse(policy)?).filter(|schedule| !schedule.is_empty())
    };

    let mut entries = Vec::with_capacity(names.len());
    let mut unmanaged = Vec::new();
    let mut future = Vec::new();

    for name in names {
        let name = name.as_ref();
        let entry = match options.format.entry(name) {
            Some(entry) => entry,
            None => {
                unmanaged.push(name.to_string());
                continue;
            }
        };
        if entry.time > now {
            if options.reject_future {
                return Err(Error::FutureSnapshot {
                    name: entry.name,
                    time: entry.time,
                    now,
                });
            }
            future.push(entry.clone());
        }
        entries.push(entry);
    }

    let (keep, remove) = match schedule {
        Some(schedule) => thin(entries, &schedule, now, &options.pinned),
        None => {
            entries.sort_by(|a, b| b.time.cmp(&a.time));
            (entries, Vec::new())
        }
    };

    Ok(PrunePlan {
        keep,
        remove,
        unmanaged,
        future,
        policy: policy.to_string(),
    })
}
