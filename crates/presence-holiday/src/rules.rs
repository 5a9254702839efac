//! # Rule-Based Holiday Calendars
//!
//! Offline holiday tables expressed as date rules, resolved per year.
//!
//! ## Observance
//!
//! A holiday falling on a weekend can move:
//!
//! - [`Observance::Actual`]: stays put (Germany).
//! - [`Observance::NearestWeekday`]: Saturday → Friday, Sunday → Monday
//!   (US federal). New Year's Day on a Saturday is therefore observed on
//!   31 December of the previous year.
//! - [`Observance::Substitute`]: moves to the next weekday that is not
//!   already a holiday (GB and CA substitute days). Christmas on a Saturday
//!   lands on Monday 27th and Boxing Day on Tuesday 28th.
//!
//! Weekday holidays are placed before any substitute is assigned, so a
//! substitute never displaces a real holiday.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use presence_core::CalendarDate;

use crate::error::HolidayError;
use crate::provider::{apply_weekday_filter, normalize_country, HolidayProvider, HolidaySet};

// ─── Rules ───────────────────────────────────────────────────────────

/// How a weekend holiday is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observance {
    /// Observed on the calendar date, even at weekends.
    #[default]
    Actual,
    /// Saturday → preceding Friday, Sunday → following Monday.
    NearestWeekday,
    /// Next weekday not already taken by another holiday.
    Substitute,
}

/// One holiday, expressed as a rule that yields a date for any year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayRule {
    /// The same month and day every year.
    Fixed {
        month: u32,
        day: u32,
        #[serde(default)]
        observance: Observance,
    },
    /// The `n`th `weekday` of `month` (1-based).
    NthWeekday { month: u32, weekday: Weekday, n: u8 },
    /// The last `weekday` of `month`.
    LastWeekday { month: u32, weekday: Weekday },
    /// The last `weekday` strictly before `month`/`day`.
    WeekdayBefore { month: u32, day: u32, weekday: Weekday },
    /// Days relative to Western Easter Sunday.
    EasterOffset { days: i64 },
}

impl HolidayRule {
    const fn fixed(month: u32, day: u32) -> Self {
        Self::Fixed {
            month,
            day,
            observance: Observance::Actual,
        }
    }

    const fn observed(month: u32, day: u32, observance: Observance) -> Self {
        Self::Fixed {
            month,
            day,
            observance,
        }
    }

    const fn nth(month: u32, weekday: Weekday, n: u8) -> Self {
        Self::NthWeekday { month, weekday, n }
    }

    const fn last(month: u32, weekday: Weekday) -> Self {
        Self::LastWeekday { month, weekday }
    }

    const fn easter(days: i64) -> Self {
        Self::EasterOffset { days }
    }

    fn observance(&self) -> Observance {
        match self {
            Self::Fixed { observance, .. } => *observance,
            _ => Observance::Actual,
        }
    }

    /// The unshifted calendar date of this holiday in `year`.
    pub fn actual_date(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Self::Fixed { month, day, .. } => NaiveDate::from_ymd_opt(year, month, day),
            Self::NthWeekday { month, weekday, n } => {
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
            }
            Self::LastWeekday { month, weekday } => {
                let (next_year, next_month) = if month == 12 {
                    (year.checked_add(1)?, 1)
                } else {
                    (year, month.checked_add(1)?)
                };
                let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
                walk_back_to(last_day, weekday)
            }
            Self::WeekdayBefore { month, day, weekday } => {
                let anchor = NaiveDate::from_ymd_opt(year, month, day)?.pred_opt()?;
                walk_back_to(anchor, weekday)
            }
            Self::EasterOffset { days } => {
                let offset = chrono::TimeDelta::try_days(days)?;
                easter_sunday(year)?.checked_add_signed(offset)
            }
        }
    }
}

fn walk_back_to(mut date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    while date.weekday() != weekday {
        date = date.pred_opt()?;
    }
    Some(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Western (Gregorian) Easter Sunday, anonymous Gregorian algorithm.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Observed holiday dates produced by `rules` for one year.
fn observed_dates(rules: &[HolidayRule], year: i32) -> BTreeSet<NaiveDate> {
    let mut taken = BTreeSet::new();
    let mut pending = Vec::new();

    for rule in rules {
        let Some(date) = rule.actual_date(year) else {
            continue;
        };
        match rule.observance() {
            Observance::Actual => {
                taken.insert(date);
            }
            Observance::NearestWeekday => {
                let shifted = match date.weekday() {
                    Weekday::Sat => date.pred_opt(),
                    Weekday::Sun => date.succ_opt(),
                    _ => Some(date),
                };
                if let Some(shifted) = shifted {
                    taken.insert(shifted);
                }
            }
            Observance::Substitute if is_weekend(date) => pending.push(date),
            Observance::Substitute => {
                taken.insert(date);
            }
        }
    }

    for date in pending {
        let mut candidate = date;
        while let Some(next) = candidate.succ_opt() {
            candidate = next;
            if !is_weekend(candidate) && !taken.contains(&candidate) {
                taken.insert(candidate);
                break;
            }
        }
    }

    taken
}

// ─── Built-in tables ─────────────────────────────────────────────────

use HolidayRule as R;
use Observance::{NearestWeekday, Substitute};

/// United States federal holidays.
const US: &[HolidayRule] = &[
    R::observed(1, 1, NearestWeekday),
    R::nth(1, Weekday::Mon, 3),
    R::nth(2, Weekday::Mon, 3),
    R::last(5, Weekday::Mon),
    R::observed(6, 19, NearestWeekday),
    R::observed(7, 4, NearestWeekday),
    R::nth(9, Weekday::Mon, 1),
    R::nth(10, Weekday::Mon, 2),
    R::observed(11, 11, NearestWeekday),
    R::nth(11, Weekday::Thu, 4),
    R::observed(12, 25, NearestWeekday),
];

/// England and Wales bank holidays.
const GB: &[HolidayRule] = &[
    R::observed(1, 1, Substitute),
    R::easter(-2),
    R::easter(1),
    R::nth(5, Weekday::Mon, 1),
    R::last(5, Weekday::Mon),
    R::last(8, Weekday::Mon),
    R::observed(12, 25, Substitute),
    R::observed(12, 26, Substitute),
];

/// Germany, nationwide holidays.
const DE: &[HolidayRule] = &[
    R::fixed(1, 1),
    R::easter(-2),
    R::easter(1),
    R::fixed(5, 1),
    R::easter(39),
    R::easter(50),
    R::fixed(10, 3),
    R::fixed(12, 25),
    R::fixed(12, 26),
];

/// Canada, federal statutory holidays.
const CA: &[HolidayRule] = &[
    R::observed(1, 1, Substitute),
    R::easter(-2),
    R::WeekdayBefore {
        month: 5,
        day: 25,
        weekday: Weekday::Mon,
    },
    R::observed(7, 1, Substitute),
    R::nth(9, Weekday::Mon, 1),
    R::nth(10, Weekday::Mon, 2),
    R::observed(12, 25, Substitute),
    R::observed(12, 26, Substitute),
];

fn builtin_tables() -> [(&'static str, &'static [HolidayRule]); 4] {
    [("US", US), ("GB", GB), ("DE", DE), ("CA", CA)]
}

// ─── Provider ────────────────────────────────────────────────────────

/// Offline provider backed by rule tables.
///
/// Company calendars add to, never replace, their country's holidays.
/// Company names match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedProvider {
    countries: HashMap<String, Vec<HolidayRule>>,
    companies: HashMap<(String, String), Vec<HolidayRule>>,
}

impl RuleBasedProvider {
    /// A provider with no calendars.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider pre-loaded with the US, GB, DE and CA tables.
    pub fn with_builtin_calendars() -> Self {
        let mut provider = Self::new();
        for (code, rules) in builtin_tables() {
            provider.countries.insert(code.to_string(), rules.to_vec());
        }
        provider
    }

    /// Register or replace a country table.
    pub fn with_country(mut self, country_code: &str, rules: Vec<HolidayRule>) -> Self {
        self.countries.insert(normalize_country(country_code), rules);
        self
    }

    /// Register extra days for a company within a country.
    pub fn with_company(mut self, country_code: &str, company: &str, rules: Vec<HolidayRule>) -> Self {
        self.companies.insert(
            (normalize_country(country_code), company.trim().to_lowercase()),
            rules,
        );
        self
    }

    /// Country codes with a table, sorted.
    pub fn countries(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.countries.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Synchronous resolution; the trait method delegates here.
    pub fn resolve(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> Result<HolidaySet, HolidayError> {
        let country = normalize_country(country_code);
        if country.is_empty() {
            return Ok(HolidaySet::new());
        }

        let country_rules = self
            .countries
            .get(&country)
            .ok_or_else(|| HolidayError::UnknownCountry(country.clone()))?;

        let company_rules = match company.map(|c| c.trim().to_lowercase()) {
            Some(name) if !name.is_empty() => {
                let rules = self.companies.get(&(country.clone(), name.clone()));
                if rules.is_none() {
                    tracing::debug!(country = %country, company = %name, "no company calendar registered");
                }
                rules.map(Vec::as_slice).unwrap_or(&[])
            }
            _ => &[],
        };

        let wanted: BTreeSet<i32> = years.iter().copied().collect();
        let mut dates = HolidaySet::new();
        // Neighbouring years are resolved too, so that a shifted observance
        // crossing New Year lands in the right year.
        let years: BTreeSet<i32> = wanted
            .iter()
            .flat_map(|y| [y.checked_sub(1), Some(*y), y.checked_add(1)])
            .flatten()
            .collect();
        for year in years {
            for date in observed_dates(country_rules, year)
                .into_iter()
                .chain(observed_dates(company_rules, year))
            {
                if wanted.contains(&date.year()) {
                    dates.insert(CalendarDate::from(date));
                }
            }
        }

        Ok(apply_weekday_filter(dates, weekdays_only))
    }
}

impl HolidayProvider for RuleBasedProvider {
    async fn holiday_dates(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> Result<HolidaySet, HolidayError> {
        self.resolve(country_code, company, years, weekdays_only)
    }
}
