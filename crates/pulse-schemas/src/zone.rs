//! Reference-timezone day arithmetic.
//!
//! Every day-partitioned decision (which calendar day a record belongs to,
//! what "today" is, the bounds of a reconciliation window) is made in one
//! fixed reference timezone. The default is `Asia/Taipei` (UTC+8, no DST).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefZone {
    tz: Tz,
}

impl Default for RefZone {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Taipei)
    }
}

impl RefZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA zone name such as `"Asia/Taipei"`.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let tz: Tz = name
            .trim()
            .parse()
            .map_err(|e| ConfigError::malformed("reference timezone", format!("'{name}': {e}")))?;
        Ok(Self::new(tz))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Calendar day of `t` in the reference zone.
    pub fn day_of(&self, t: DateTime<Utc>) -> NaiveDate {
        t.with_timezone(&self.tz).date_naive()
    }

    /// Wall-clock time of `t` in the reference zone.
    pub fn local_time_of(&self, t: DateTime<Utc>) -> NaiveTime {
        t.with_timezone(&self.tz).time()
    }

    /// First instant of `day` in the reference zone.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight).earliest() {
            Some(t) => t.with_timezone(&Utc),
            // Midnight skipped by a DST jump: the day starts at the first
            // representable instant after it.
            None => self.tz.from_utc_datetime(&midnight).with_timezone(&Utc),
        }
    }
}

// ---------------------------------------------------------------------------
// DayWindow
// ---------------------------------------------------------------------------

/// Half-open window `[after, before)` truncated to whole days in the
/// reference zone.
///
/// `end_day` is exclusive: the window covers `first_day ..= end_day - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayWindow {
    pub first_day: NaiveDate,
    pub end_day: NaiveDate,
    zone: RefZone,
}

impl DayWindow {
    pub fn new(first_day: NaiveDate, end_day: NaiveDate, zone: RefZone) -> Self {
        Self {
            first_day,
            end_day,
            zone,
        }
    }

    /// The `lookback_days` days that end at (and exclude) the day of `now`.
    pub fn trailing(now: DateTime<Utc>, lookback_days: u32, zone: RefZone) -> Self {
        let after = now - Duration::days(i64::from(lookback_days));
        Self::new(zone.day_of(after), zone.day_of(now), zone)
    }

    pub fn zone(&self) -> RefZone {
        self.zone
    }

    pub fn after(&self) -> DateTime<Utc> {
        self.zone.start_of_day(self.first_day)
    }

    pub fn before(&self) -> DateTime<Utc> {
        self.zone.start_of_day(self.end_day)
    }

    /// Last day inside the window, or `None` when the window is empty.
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.end_day.pred_opt().filter(|d| *d >= self.first_day)
    }

    pub fn is_empty(&self) -> bool {
        self.end_day <= self.first_day
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.after() && t < self.before()
    }
}
