//! # Calendar Dates — Date-Only Keys
//!
//! Defines `CalendarDate`, the canonical key for every date-indexed
//! structure, and `DateRange`, an inclusive span of calendar days.
//!
//! ## Invariant
//!
//! A `CalendarDate` has no time-of-day and no timezone. Whether it was built
//! from a `NaiveDate` or from a string, it renders as `YYYY-MM-DD` and
//! compares equal to every other representation of the same day.
//!
//! Accepted string forms:
//!
//! - `2026-02-02`
//! - `2026-02-02T09:30:00Z`, `2026-02-02T23:00:00-05:00`: the calendar date
//!   exactly as written. Offsets are never applied.
//! - `2026-02-02T09:30:00`
//!
//! Anything else is rejected with [`PresenceError::InvalidDate`].

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::PresenceError;

/// Canonical `YYYY-MM-DD` format.
const ISO_DATE: &str = "%Y-%m-%d";

// ─── CalendarDate ────────────────────────────────────────────────────

/// A normalized calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date from year, month and day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, PresenceError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                PresenceError::invalid_date(
                    format!("{year:04}-{month:02}-{day:02}"),
                    "no such calendar day",
                )
            })
    }

    /// Parse and normalize a date string.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::InvalidDate`] if the input is empty or is not
    /// one of the accepted forms.
    pub fn parse(input: &str) -> Result<Self, PresenceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PresenceError::invalid_date(input, "empty input"));
        }

        let date_only = match NaiveDate::parse_from_str(trimmed, ISO_DATE) {
            Ok(d) => return Ok(Self(d)),
            Err(e) => e,
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(dt.date_naive()));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(dt.date()));
        }

        Err(PresenceError::invalid_date(input, date_only))
    }

    /// Today's date on the local calendar.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Access the inner `NaiveDate`.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Day of the week.
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// The date `days` later, or `None` past the end of the calendar.
    pub fn checked_add_days(&self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Self)
    }

    /// Render as `YYYY-MM-DD`.
    pub fn to_iso(&self) -> String {
        self.0.format(ISO_DATE).to_string()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<CalendarDate> for NaiveDate {
    fn from(date: CalendarDate) -> Self {
        date.0
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_iso()
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = PresenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::str::FromStr for CalendarDate {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(ISO_DATE))
    }
}

// ─── Normalization ───────────────────────────────────────────────────

/// Anything that can be normalized into a [`CalendarDate`].
///
/// Store and validator entry points accept any implementor, so callers can
/// pass strings straight from a UI or dates from their own arithmetic.
pub trait AsCalendarDate {
    /// Normalize to the canonical key.
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError>;
}

impl AsCalendarDate for CalendarDate {
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError> {
        Ok(*self)
    }
}

impl AsCalendarDate for NaiveDate {
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError> {
        Ok(CalendarDate(*self))
    }
}

impl AsCalendarDate for str {
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError> {
        CalendarDate::parse(self)
    }
}

impl AsCalendarDate for String {
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError> {
        CalendarDate::parse(self)
    }
}

impl<T: AsCalendarDate + ?Sized> AsCalendarDate for &T {
    fn to_calendar_date(&self) -> Result<CalendarDate, PresenceError> {
        (**self).to_calendar_date()
    }
}

// ─── DateRange ───────────────────────────────────────────────────────

/// An inclusive span of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: CalendarDate,
    end: CalendarDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: CalendarDate,
    end: CalendarDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = PresenceError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: CalendarDate, end: CalendarDate) -> Result<Self, PresenceError> {
        if start > end {
            return Err(PresenceError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the range.
    pub fn start(&self) -> CalendarDate {
        self.start
    }

    /// Last day of the range (inclusive).
    pub fn end(&self) -> CalendarDate {
        self.end
    }

    /// Whether `date` lies within the range, inclusive at both ends.
    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the range.
    pub fn len_days(&self) -> u64 {
        // start <= end, so the difference is never negative.
        (self.end.0 - self.start.0).num_days().unsigned_abs() + 1
    }

    /// Every day of the range in chronological order.
    pub fn days(&self) -> impl Iterator<Item = CalendarDate> {
        let end = self.end.0;
        self.start
            .0
            .iter_days()
            .take_while(move |d| *d <= end)
            .map(CalendarDate)
    }

    /// The distinct calendar years the range touches, ascending.
    pub fn years(&self) -> Vec<i32> {
        (self.start.year()..=self.end.year()).collect()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Monday through Friday.
pub fn is_weekday(date: CalendarDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The range a calendar shows when nothing else is configured: the first
/// day of `today`'s month through the last day of the month two months on.
pub fn default_visible_range(today: CalendarDate) -> DateRange {
    let start = today.0.with_day(1).unwrap_or(today.0);
    let end = start
        .checked_add_months(Months::new(3))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    DateRange {
        start: CalendarDate(start),
        end: CalendarDate(end),
    }
}
