//! The holiday provider interface.

use std::collections::BTreeSet;
use std::future::Future;

use presence_core::{is_weekday, CalendarDate};

use crate::error::HolidayError;

/// Ordered, de-duplicated holiday dates.
pub type HolidaySet = BTreeSet<CalendarDate>;

/// A source of holiday dates.
///
/// Implementations may perform I/O; callers await the result before using
/// it. An empty `country_code` means no country is selected and must
/// resolve to an empty set, not an error.
pub trait HolidayProvider: Send + Sync {
    /// Holidays observed in `country_code` during `years`.
    ///
    /// `company` adds company-specific days where the source supports them.
    /// With `weekdays_only`, dates falling on Saturday or Sunday are dropped.
    fn holiday_dates(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> impl Future<Output = Result<HolidaySet, HolidayError>> + Send;
}

/// Drop weekend dates when `weekdays_only` is set.
pub(crate) fn apply_weekday_filter(dates: HolidaySet, weekdays_only: bool) -> HolidaySet {
    if weekdays_only {
        dates.into_iter().filter(|d| is_weekday(*d)).collect()
    } else {
        dates
    }
}

/// Canonical form of a country selector: trimmed, upper-case.
pub(crate) fn normalize_country(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
