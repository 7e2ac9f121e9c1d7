use std::fmt;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

/// Boxed error returned by a snapshot backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A rotation policy string that does not follow the schedule grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("empty element found at position {position} (double comma?)")]
    EmptyElement { position: usize },

    #[error("always-keep specified more than once (got {element:?})")]
    AlwaysKeepRepeated { element: String },

    #[error("always-keep must be the first element (got {element:?} at position {position})")]
    AlwaysKeepNotFirst { element: String, position: usize },

    #[error("invalid always-keep {element:?}")]
    InvalidAlwaysKeep { element: String },

    #[error("invalid rule {rule:?} (expected e.g. 1d1w)")]
    InvalidRule { rule: String },

    #[error("invalid rule {rule:?} (amounts must be > 0)")]
    NonPositiveAmount { rule: String },

    #[error("invalid rule {rule:?} (amount out of range)")]
    AmountOutOfRange { rule: String },

    #[error("unknown unit {unit:?} in {rule:?} (use s|min|h|d|w|m|y)")]
    UnknownUnit { rule: String, unit: String },

    #[error("invalid rule {rule:?} (period > ttl)")]
    PeriodExceedsTtl { rule: String },

    #[error("duplicate period {period:?} in schedule ({first:?} and {second:?})")]
    DuplicatePeriod {
        period: Duration,
        first: String,
        second: String,
    },
}

/// Errors raised while planning or executing a prune.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("invalid snapshot name format {format:?}: {reason}")]
    InvalidNameFormat { format: String, reason: String },

    #[error("snapshot {name:?} is in the future ({time} > {now})")]
    FutureSnapshot {
        name: String,
        time: OffsetDateTime,
        now: OffsetDateTime,
    },

    #[error("list {kind} snapshots failed: {source}")]
    List {
        kind: String,
        #[source]
        source: BackendError,
    },

    #[error("delete {kind} snapshot {name:?} failed after {deleted} deletion(s): {source}")]
    Delete {
        kind: String,
        name: String,
        deleted: usize,
        #[source]
        source: BackendError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// One invalid policy found while validating a retention configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending setting, e.g. `retention.hosts.source.default`.
    pub path: String,
    pub error: PolicyError,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Every invalid policy of a retention configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}
