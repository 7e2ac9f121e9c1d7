//! Property-based tests for schedule parsing and thinning.
//!
//! - parsing is deterministic for valid policies
//! - duplicate periods and period > ttl are always rejected
//! - thinning partitions its input exactly
//! - the always-keep newest and every future-dated entry are kept

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use snapkeep::{parse_schedule, thin, Entry, PolicyError, Schedule};

const NOW: OffsetDateTime = datetime!(2026-02-05 12:00 UTC);
const UNITS: [&str; 7] = ["s", "min", "h", "d", "w", "m", "y"];

// =============================================================================
// Strategies
// =============================================================================

/// A valid rule per chosen unit. Amounts stay small so no two units collide
/// on the same period.
fn arb_policy() -> impl Strategy<Value = String> {
    (
        proptest::option::of(0usize..50),
        proptest::sample::subsequence(UNITS.to_vec(), 0..=UNITS.len()),
        proptest::collection::vec((1u64..=5, 1u64..=20), UNITS.len()),
    )
        .prop_map(|(always_keep, units, amounts)| {
            let mut parts: Vec<String> = Vec::new();
            if let Some(n) = always_keep {
                parts.push(n.to_string());
            }
            for (unit, (period, factor)) in units.iter().zip(amounts) {
                parts.push(format!("{period}{unit}{}{unit}", period * factor));
            }
            parts.join(",")
        })
}

fn arb_schedule() -> impl Strategy<Value = Schedule> {
    arb_policy().prop_map(|policy| parse_schedule(&policy).expect("generated policy parses"))
}

/// Entries with unique names, spread from 400 days back to 30 days ahead.
fn arb_entries() -> impl Strategy<Value = Vec<Entry>> {
    proptest::collection::vec(-30 * 86_400i64..400 * 86_400, 0..200).prop_map(|ages| {
        ages.into_iter()
            .enumerate()
            .map(|(idx, age)| Entry::new(format!("snap-{idx}"), NOW - Duration::seconds(age)))
            .collect()
    })
}

fn names(entries: &[Entry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

// =============================================================================
// Parser properties
// =============================================================================

proptest! {
    #[test]
    fn parse_is_deterministic(policy in arb_policy()) {
        let first = parse_schedule(&policy);
        let second = parse_schedule(&policy);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn duplicate_period_is_rejected(
        unit in proptest::sample::select(UNITS.to_vec()),
        period in 1u64..=50,
        ttl_a in 1u64..=10,
        ttl_b in 1u64..=10,
    ) {
        let policy = format!(
            "{period}{unit}{}{unit},{period}{unit}{}{unit}",
            period * ttl_a,
            period * ttl_b
        );
        let is_duplicate = matches!(
            parse_schedule(&policy),
            Err(PolicyError::DuplicatePeriod { .. })
        );
        prop_assert!(is_duplicate, "{}", policy);
    }

    #[test]
    fn period_beyond_ttl_is_rejected(
        unit in proptest::sample::select(UNITS.to_vec()),
        ttl in 1u64..=100,
        extra in 1u64..=100,
        leading in proptest::option::of(0usize..10),
    ) {
        let rule = format!("{}{unit}{ttl}{unit}", ttl + extra);
        let policy = match leading {
            Some(n) => format!("{n},{rule}"),
            None => rule,
        };
        prop_assert_eq!(
            parse_schedule(&policy),
            Err(PolicyError::PeriodExceedsTtl { rule: format!("{}{unit}{ttl}{unit}", ttl + extra) })
        );
    }
}

// =============================================================================
// Thinning properties
// =============================================================================

proptest! {
    #[test]
    fn thin_partitions_input(entries in arb_entries(), schedule in arb_schedule()) {
        let input = names(&entries);
        let (keep, remove) = thin(entries, &schedule, NOW, &HashSet::new());
        prop_assert_eq!(keep.len() + remove.len(), input.len());

        let kept = names(&keep);
        let removed = names(&remove);
        prop_assert!(kept.is_disjoint(&removed));
        let union: BTreeSet<String> = kept.union(&removed).cloned().collect();
        prop_assert_eq!(union, input);
    }

    #[test]
    fn newest_always_keep_are_kept(entries in arb_entries(), schedule in arb_schedule()) {
        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| b.time.cmp(&a.time));
        let (keep, _) = thin(entries, &schedule, NOW, &HashSet::new());
        let kept = names(&keep);

        // Ties at the boundary may go either way; strictly newer ones may not.
        let boundary = schedule
            .always_keep
            .checked_sub(1)
            .and_then(|idx| sorted.get(idx));
        if let Some(boundary) = boundary {
            for entry in sorted.iter().filter(|e| e.time > boundary.time) {
                prop_assert!(kept.contains(&entry.name), "{} dropped", entry.name);
            }
        }
        if schedule.always_keep >= sorted.len() {
            prop_assert_eq!(kept.len(), sorted.len());
        }
    }

    #[test]
    fn future_entries_are_kept(entries in arb_entries(), schedule in arb_schedule()) {
        let future: Vec<String> = entries
            .iter()
            .filter(|e| e.time > NOW)
            .map(|e| e.name.clone())
            .collect();
        let (keep, _) = thin(entries, &schedule, NOW, &HashSet::new());
        let kept = names(&keep);
        for name in future {
            prop_assert!(kept.contains(&name), "{} dropped", name);
        }
    }

    #[test]
    fn pinned_entries_are_kept(
        entries in arb_entries(),
        schedule in arb_schedule(),
        stride in 1usize..7,
    ) {
        let pinned: HashSet<String> = entries
            .iter()
            .step_by(stride)
            .map(|e| e.name.clone())
            .collect();
        let (_, remove) = thin(entries, &schedule, NOW, &pinned);
        for entry in &remove {
            prop_assert!(!pinned.contains(&entry.name));
        }
    }

    #[test]
    fn thinning_kept_entries_again_removes_nothing(
        entries in arb_entries(),
        schedule in arb_schedule(),
    ) {
        let (keep, _) = thin(entries, &schedule, NOW, &HashSet::new());
        let before = keep.len();
        let (again, remove) = thin(keep, &schedule, NOW, &HashSet::new());
        prop_assert!(remove.is_empty());
        prop_assert_eq!(again.len(), before);
    }
}
