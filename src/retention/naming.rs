//! Snapshot name contract: a fixed prefix followed by a timestamp.

use serde::Serialize;
use time::format_description::{self, OwnedFormatItem};
use time::macros::{datetime, format_description};
use time::parsing::Parsed;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{Error, Result};

/// One managed snapshot: its name and the instant encoded in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

impl Entry {
    pub fn new(name: impl Into<String>, time: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            time,
        }
    }
}

/// How managed snapshot names are recognized.
///
/// A name is managed when it starts with `prefix` and the remainder parses
/// with the timestamp format, interpreted at `offset`. Anything else is left
/// alone.
#[derive(Debug, Clone)]
pub struct NameFormat {
    prefix: String,
    description: String,
    items: OwnedFormatItem,
    offset: UtcOffset,
}

impl NameFormat {
    pub const DEFAULT_PREFIX: &'static str = "IAB_";
    pub const DEFAULT_TIMESTAMP: &'static str = "[year][month][day]-[hour][minute][second]";

    /// Build a format from a prefix and a `time` format description, e.g.
    /// `[year][month][day]-[hour][minute][second]`. An empty prefix matches
    /// every name.
    ///
    /// Layouts without a time of day are allowed and read as midnight. A
    /// layout that cannot recover a calendar date is rejected.
    pub fn new(prefix: impl Into<String>, description: &str) -> Result<Self> {
        let items = format_description::parse_owned::<1>(description).map_err(|err| {
            Error::InvalidNameFormat {
                format: description.to_string(),
                reason: err.to_string(),
            }
        })?;
        let format = Self {
            prefix: prefix.into(),
            description: description.to_string(),
            items,
            offset: UtcOffset::UTC,
        };

        let sample = format.name_for(datetime!(2001-02-03 04:05:06 UTC))?;
        if format.parse(&sample).is_none() {
            return Err(Error::InvalidNameFormat {
                format: description.to_string(),
                reason: "layout does not encode a full calendar date".to_string(),
            });
        }
        Ok(format)
    }

    /// Interpret embedded timestamps at `offset` instead of UTC.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_prefix(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Timestamp encoded in `name`, or `None` if the name is not managed.
    ///
    /// Missing hour, minute or second fields default to zero.
    pub fn parse(&self, name: &str) -> Option<OffsetDateTime> {
        let stamp = name.strip_prefix(self.prefix.as_str())?;
        let mut parsed = Parsed::new();
        let rest = parsed.parse_item(stamp.as_bytes(), &self.items).ok()?;
        if !rest.is_empty() {
            return None;
        }
        if parsed.hour_24().is_none() && parsed.hour_12().is_none() {
            parsed.set_hour_24(0)?;
        }
        if parsed.minute().is_none() {
            parsed.set_minute(0)?;
        }
        if parsed.second().is_none() {
            parsed.set_second(0)?;
        }
        PrimitiveDateTime::try_from(parsed)
            .ok()
            .map(|naive| naive.assume_offset(self.offset))
    }

    pub fn entry(&self, name: &str) -> Option<Entry> {
        self.parse(name).map(|time| Entry::new(name, time))
    }

    /// Render the name a snapshot taken at `time` would carry.
    pub fn name_for(&self, time: OffsetDateTime) -> Result<String> {
        let local = time.to_offset(self.offset);
        let stamp = PrimitiveDateTime::new(local.date(), local.time())
            .format(&self.items)
            .map_err(|err| Error::InvalidNameFormat {
                format: self.description.clone(),
                reason: err.to_string(),
            })?;
        Ok(format!("{}{}", self.prefix, stamp))
    }
}

impl Default for NameFormat {
    fn default() -> Self {
        Self {
            prefix: Self::DEFAULT_PREFIX.to_string(),
            description: Self::DEFAULT_TIMESTAMP.to_string(),
            items: OwnedFormatItem::from(format_description!(
                "[year][month][day]-[hour][minute][second]"
            )),
            offset: UtcOffset::UTC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn parses_default_names() {
        let format = NameFormat::default();
        assert_eq!(
            format.parse("IAB_20260205-110000"),
            Some(datetime!(2026-02-05 11:00 UTC))
        );
    }

    #[test]
    fn rejects_unmanaged_names() {
        let format = NameFormat::default();
        for name in [
            "manual_20260203",
            "IAB_not-a-time",
            "iab_20210101-135814",
            "IAB_20260204-11000",
            "IAB_20260204-1100000",
            "IAB_20261304-110000",
            "IAB_",
            "",
        ] {
            assert!(format.parse(name).is_none(), "{name:?}");
        }
    }

    #[test]
    fn custom_prefix_and_layout() {
        let format =
            NameFormat::new("auto-", "[year]-[month]-[day]T[hour]:[minute]:[second]").unwrap();
        assert_eq!(
            format.parse("auto-2026-01-31T23:59:00"),
            Some(datetime!(2026-01-31 23:59 UTC))
        );
        assert!(format.parse("IAB_20260131-235900").is_none());
        assert_eq!(
            format.description(),
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        );
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let format = NameFormat::new("", NameFormat::DEFAULT_TIMESTAMP).unwrap();
        assert!(format.has_prefix("anything"));
        assert!(format.parse("20260101-000000").is_some());
    }

    #[test]
    fn offset_shifts_interpretation() {
        let format = NameFormat::default().with_offset(offset!(+2));
        assert_eq!(
            format.parse("IAB_20260205-120000"),
            Some(datetime!(2026-02-05 10:00 UTC))
        );
    }

    #[test]
    fn name_for_renders_in_format_offset() {
        let format = NameFormat::default().with_offset(offset!(+1));
        let name = format.name_for(datetime!(2026-02-05 11:30:15 UTC)).unwrap();
        assert_eq!(name, "IAB_20260205-123015");
        assert_eq!(format.parse(&name), Some(datetime!(2026-02-05 11:30:15 UTC)));
    }

    #[test]
    fn date_only_layout_reads_midnight() {
        let format = NameFormat::new("snap_", "[year][month][day]").unwrap();
        assert_eq!(
            format.parse("snap_20260101"),
            Some(datetime!(2026-01-01 00:00 UTC))
        );
        assert!(format.parse("snap_2026010").is_none());
        assert!(format.parse("snap_20260101-1200").is_none());
        assert_eq!(
            format.name_for(datetime!(2026-01-02 18:30 UTC)).unwrap(),
            "snap_20260102"
        );
    }

    #[test]
    fn hour_without_minutes_is_accepted() {
        let format = NameFormat::new("h-", "[year][month][day]T[hour]").unwrap();
        assert_eq!(
            format.parse("h-20260101T07"),
            Some(datetime!(2026-01-01 07:00 UTC))
        );
    }

    #[test]
    fn layout_without_date_is_rejected() {
        for description in ["[hour][minute][second]", "[year][month]", "[month][day]"] {
            let err = NameFormat::new("x_", description).unwrap_err();
            assert!(
                matches!(err, Error::InvalidNameFormat { ref format, .. } if format == description),
                "{description}: {err}"
            );
        }
    }

    #[test]
    fn invalid_description_is_an_error() {
        let err = NameFormat::new("x_", "[year][bogus]").unwrap_err();
        assert!(matches!(err, Error::InvalidNameFormat { .. }));
    }
}
