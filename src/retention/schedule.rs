//! Rotation schedule grammar.
//!
//! A schedule is a comma-separated list. The first element may be a bare
//! integer, the number of newest snapshots kept unconditionally. Every other
//! element is a rule `<amount><unit><amount><unit>`: keep one snapshot per
//! period for snapshots younger than the ttl, e.g. `1d2w`.
//!
//! Units are fixed multiples of a second. A month is 30 days and a year is
//! 365 days; there is no calendar arithmetic.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PolicyError;

lazy_static! {
    static ref RULE_RE: Regex =
        Regex::new(r"^([0-9]+)([a-z]+)([0-9]+)([a-z]+)$").expect("rule pattern compiles");
}

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Unit tokens and their length in seconds.
const UNITS: [(&str, u64); 7] = [
    ("s", 1),
    ("min", SECS_PER_MINUTE),
    ("h", SECS_PER_HOUR),
    ("d", SECS_PER_DAY),
    ("w", 7 * SECS_PER_DAY),
    ("m", 30 * SECS_PER_DAY),
    ("y", 365 * SECS_PER_DAY),
];

/// One rotation band: keep one snapshot per `period` while younger than `ttl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Bucket width. Always non-zero and `<= ttl`.
    pub period: Duration,
    /// Maximum age for which this band applies.
    pub ttl: Duration,
    /// Element text as written in the policy.
    pub raw: String,
}

/// A parsed rotation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Number of newest snapshots exempt from rule logic.
    pub always_keep: usize,
    /// Rules in policy order; periods are pairwise distinct.
    pub rules: Vec<Rule>,
    /// Trimmed policy text.
    pub raw: String,
}

impl Schedule {
    /// True when the schedule neither keeps a fixed count nor has any rule.
    ///
    /// Plans built from such a schedule keep everything.
    pub fn is_empty(&self) -> bool {
        self.always_keep == 0 && self.rules.is_empty()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Schedule {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_schedule(s)
    }
}

/// Parse a policy string into a [`Schedule`].
///
/// Blank input yields an empty schedule (retention disabled).
pub fn parse_schedule(text: &str) -> Result<Schedule, PolicyError> {
    let mut schedule = Schedule {
        raw: text.trim().to_string(),
        ..Schedule::default()
    };
    if schedule.raw.is_empty() {
        return Ok(schedule);
    }

    let mut seen_always_keep = false;
    // period -> raw rule, for the duplicate message
    let mut seen_periods: HashMap<Duration, String> = HashMap::new();

    for (idx, element) in schedule.raw.split(',').enumerate() {
        let element = element.trim();
        let position = idx + 1;
        if element.is_empty() {
            return Err(PolicyError::EmptyElement { position });
        }

        if element.bytes().all(|b| b.is_ascii_digit()) {
            if seen_always_keep {
                return Err(PolicyError::AlwaysKeepRepeated {
                    element: element.to_string(),
                });
            }
            if idx != 0 {
                return Err(PolicyError::AlwaysKeepNotFirst {
                    element: element.to_string(),
                    position,
                });
            }
            schedule.always_keep = element.parse().map_err(|_| PolicyError::InvalidAlwaysKeep {
                element: element.to_string(),
            })?;
            seen_always_keep = true;
            continue;
        }

        let rule = parse_rule(element)?;
        if let Some(first) = seen_periods.get(&rule.period) {
            return Err(PolicyError::DuplicatePeriod {
                period: rule.period,
                first: first.clone(),
                second: rule.raw,
            });
        }
        seen_periods.insert(rule.period, rule.raw.clone());
        schedule.rules.push(rule);
    }

    Ok(schedule)
}

fn parse_rule(element: &str) -> Result<Rule, PolicyError> {
    let invalid = || PolicyError::InvalidRule {
        rule: element.to_string(),
    };
    let lowered = element.to_ascii_lowercase();
    let caps = RULE_RE.captures(&lowered).ok_or_else(invalid)?;

    let amount = |idx: usize| -> Result<u64, PolicyError> {
        caps[idx]
            .parse::<u64>()
            .map_err(|_| PolicyError::AmountOutOfRange {
                rule: element.to_string(),
            })
    };
    let period_amount = amount(1)?;
    let ttl_amount = amount(3)?;
    if period_amount == 0 || ttl_amount == 0 {
        return Err(PolicyError::NonPositiveAmount {
            rule: element.to_string(),
        });
    }

    let period = to_duration(element, period_amount, &caps[2])?;
    let ttl = to_duration(element, ttl_amount, &caps[4])?;
    if period > ttl {
        return Err(PolicyError::PeriodExceedsTtl {
            rule: element.to_string(),
        });
    }

    Ok(Rule {
        period,
        ttl,
        raw: element.to_string(),
    })
}

fn to_duration(rule: &str, amount: u64, unit: &str) -> Result<Duration, PolicyError> {
    let secs = UNITS
        .iter()
        .find(|(token, _)| *token == unit)
        .map(|(_, secs)| *secs)
        .ok_or_else(|| PolicyError::UnknownUnit {
            rule: rule.to_string(),
            unit: unit.to_string(),
        })?;
    // Bucketing works on i64 unix seconds, so periods must fit there too.
    amount
        .checked_mul(secs)
        .filter(|total| i64::try_from(*total).is_ok())
        .map(Duration::from_secs)
        .ok_or_else(|| PolicyError::AmountOutOfRange {
            rule: rule.to_string(),
        })
}
