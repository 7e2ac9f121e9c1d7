//! Bucketed thinning of timestamped entries.

use std::collections::HashSet;
use std::time::Duration;

use time::OffsetDateTime;

use crate::retention::naming::Entry;
use crate::retention::schedule::Schedule;

/// Split `entries` into `(keep, remove)` according to `schedule`.
///
/// Entries are walked newest first. An entry is kept when it is one of the
/// `always_keep` newest, is named in `pinned`, is dated after `now`, or is
/// the first entry seen in some bucket `floor(unix_time / period)` of a rule
/// whose ttl covers its age. Because the walk runs newest first, each bucket
/// keeps its newest entry. Everything else is removed.
///
/// Both halves come back newest first. Entries sharing a timestamp keep
/// their relative input order, so identical input gives identical output.
pub fn thin(
    mut entries: Vec<Entry>,
    schedule: &Schedule,
    now: OffsetDateTime,
    pinned: &HashSet<String>,
) -> (Vec<Entry>, Vec<Entry>) {
    if entries.is_empty() {
        return (Vec::new(), Vec::new());
    }

    entries.sort_by_key(|entry| entry.time);

    // An always-keep count at or above the entry count protects everything.
    let protected_from = entries.len().saturating_sub(schedule.always_keep);

    let mut claimed: Vec<HashSet<i64>> = vec![HashSet::new(); schedule.rules.len()];
    let mut keep = Vec::new();
    let mut remove = Vec::new();

    for (idx, entry) in entries.into_iter().enumerate().rev() {
        if idx >= protected_from || pinned.contains(&entry.name) {
            keep.push(entry);
            continue;
        }

        let age = match Duration::try_from(now - entry.time) {
            Ok(age) => age,
            Err(_) => {
                // dated after `now`
                keep.push(entry);
                continue;
            }
        };

        let ts = entry.time.unix_timestamp();
        let mut kept_by_rule = false;
        for (rule, seen) in schedule.rules.iter().zip(claimed.iter_mut()) {
            if age > rule.ttl {
                continue;
            }
            let width = rule.period.as_secs() as i64;
            debug_assert!(width > 0, "rule {:?} has a zero period", rule.raw);
            if seen.insert(ts.div_euclid(width)) {
                kept_by_rule = true;
            }
        }

        if kept_by_rule {
            keep.push(entry);
        } else {
            remove.push(entry);
        }
    }

    (keep, remove)
}
