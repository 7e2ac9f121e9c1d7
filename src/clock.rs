use time::OffsetDateTime;

/// A source of reference time for retention decisions.
///
/// Ages are measured against this clock, so anything timestamped after
/// `now()` is treated as future-dated.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> OffsetDateTime;
}

/// A clock that reads the wall clock in UTC.
///
/// This is the default implementation. It follows NTP adjustments, which is
/// what you want when comparing against timestamps embedded in names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock frozen at one instant. Useful for previews and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
