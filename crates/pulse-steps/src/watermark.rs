//! Sync watermark.
//!
//! # Invariants
//!
//! - **Non-decreasing**: [`Watermark::advance_to`] only ever moves forward.
//!   Offering an older instant leaves the watermark where it is.
//! - **Meaning**: every bucket that starts at or before the watermark has
//!   already been forwarded.
//! - **Text form**: persisted as RFC 3339 UTC, whole seconds unless the
//!   instant carries a fraction, which is kept. Reading
//!   also accepts any RFC 3339 offset and the source's naive
//!   `YYYY-MM-DDTHH:MM:SS[.f]` form (interpreted as UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use pulse_schemas::{ConfigError, RefZone};

/// Result of offering a new instant to the watermark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// The offered instant was not later than the current watermark.
    Held {
        current: DateTime<Utc>,
        offered: DateTime<Utc>,
    },
}

impl Advance {
    pub fn moved(&self) -> bool {
        matches!(self, Advance::Moved { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Watermark {
    at: DateTime<Utc>,
}

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Calendar day (reference zone) the next sync pass starts from.
    pub fn day(&self, zone: RefZone) -> NaiveDate {
        zone.day_of(self.at)
    }

    /// `W := max(W, t)`.
    pub fn advance_to(&mut self, t: DateTime<Utc>) -> Advance {
        if t > self.at {
            let from = self.at;
            self.at = t;
            Advance::Moved { from, to: t }
        } else {
            Advance::Held {
                current: self.at,
                offered: t,
            }
        }
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_watermark(text: &str) -> Result<DateTime<Utc>, ConfigError> {
    let s = text.trim();
    if s.is_empty() {
        return Err(ConfigError::missing("steps watermark"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(ConfigError::malformed(
        "steps watermark",
        format!("'{s}' is not an RFC 3339 or YYYY-MM-DDTHH:MM:SS timestamp"),
    ))
}

/// Whole seconds print without a fraction; sub-second instants keep theirs so
/// a stored watermark never reads back earlier than it was written.
pub fn format_watermark(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn advance_is_monotonic() {
        let mut wm = Watermark::new(utc(2025, 5, 15, 15, 45));

        let a = wm.advance_to(utc(2025, 5, 16, 15, 45));
        assert!(a.moved());
        assert_eq!(wm.at(), utc(2025, 5, 16, 15, 45));

        let b = wm.advance_to(utc(2025, 5, 16, 0, 0));
        assert!(!b.moved());
        assert_eq!(wm.at(), utc(2025, 5, 16, 15, 45));

        // Equal is held, not moved.
        assert!(!wm.advance_to(utc(2025, 5, 16, 15, 45)).moved());
    }

    #[test]
    fn parse_accepts_offset_and_naive_forms() {
        let expected = utc(2025, 5, 15, 15, 45);
        assert_eq!(parse_watermark("2025-05-15T23:45:00+08:00").unwrap(), expected);
        assert_eq!(parse_watermark("2025-05-15T15:45:00Z").unwrap(), expected);
        assert_eq!(parse_watermark("2025-05-15T15:45:00.0").unwrap(), expected);
        assert_eq!(parse_watermark(" 2025-05-15T15:45:00 \n").unwrap(), expected);
    }

    #[test]
    fn parse_rejects_garbage_and_empty() {
        assert!(matches!(
            parse_watermark("yesterday"),
            Err(ConfigError::Malformed { .. })
        ));
        assert!(matches!(parse_watermark("  "), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn format_is_rfc3339_utc_seconds() {
        assert_eq!(format_watermark(utc(2025, 5, 15, 15, 45)), "2025-05-15T15:45:00Z");
    }

    #[test]
    fn fractional_watermark_survives_a_write_and_read() {
        let at = utc(2025, 5, 15, 15, 45) + chrono::Duration::milliseconds(500);
        let text = format_watermark(at);
        assert_eq!(text, "2025-05-15T15:45:00.500Z");

        let back = parse_watermark(&text).unwrap();
        assert_eq!(back, at);
        assert!(back >= at);
    }

    #[test]
    fn day_is_in_reference_zone() {
        let wm = Watermark::new(utc(2025, 5, 15, 15, 45)); // 23:45 local
        assert_eq!(
            wm.day(RefZone::default()),
            NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
        );
    }
}
