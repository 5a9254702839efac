//! # Settings — YAML Configuration with Flag Overrides
//!
//! ```yaml
//! range:
//!   start: 2026-02-01
//!   end: 2026-04-30
//! window_weeks: 12
//! min_compliant_days: 36
//! holidays:
//!   country_code: US
//!   company: Acme
//!   weekdays_only: true
//!   source: builtin          # or: nager
//!   custom_calendars:
//!     - country_code: US
//!       company: Acme
//!       rules:
//!         - nth_weekday: { month: 11, weekday: Fri, n: 4 }
//! ```
//!
//! Every key is optional. A missing `range` means the three-month view
//! starting at the current month.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use presence_compliance::{HolidaySettings, WindowPolicy};
use presence_core::{default_visible_range, CalendarDate, DateRange};
use presence_holiday::{
    CachedProvider, HolidayRule, NagerConfig, NagerHolidayProvider, RuleBasedProvider,
};

use crate::provider::SourceProvider;

/// Where holiday dates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HolidaySource {
    /// Offline rule tables.
    #[default]
    Builtin,
    /// The Nager.Date public-holiday API.
    Nager,
}

/// Extra rules for a country or company, added to the built-in tables.
///
/// Each rule is written as a single-key map (`- fixed: { month: 12, day: 24 }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCalendar {
    pub country_code: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub rules: Vec<HolidayRule>,
}

/// The `holidays` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayConfig {
    #[serde(flatten)]
    pub selector: HolidaySettings,
    pub source: HolidaySource,
    pub custom_calendars: Vec<CustomCalendar>,
}

impl HolidayConfig {
    /// Build the provider this section describes.
    pub fn provider(&self) -> Result<SourceProvider> {
        build_provider(self.source, &self.custom_calendars)
    }
}

/// Build a provider for `source`. Custom calendars apply to the built-in
/// source only.
pub fn build_provider(source: HolidaySource, custom: &[CustomCalendar]) -> Result<SourceProvider> {
    match source {
        HolidaySource::Builtin => {
            let mut rules = RuleBasedProvider::with_builtin_calendars();
            for calendar in custom {
                rules = match calendar.company.as_deref() {
                    Some(company) => rules.with_company(&calendar.country_code, company, calendar.rules.clone()),
                    None => rules.with_country(&calendar.country_code, calendar.rules.clone()),
                };
            }
            Ok(SourceProvider::Builtin(rules))
        }
        HolidaySource::Nager => {
            if !custom.is_empty() {
                tracing::warn!(count = custom.len(), "custom calendars are ignored by the nager source");
            }
            let config = NagerConfig::from_env().context("invalid holiday API configuration")?;
            let client = NagerHolidayProvider::new(config).context("failed to build holiday API client")?;
            Ok(SourceProvider::Nager(CachedProvider::new(client)))
        }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub range: Option<DateRange>,
    pub window_weeks: u32,
    pub min_compliant_days: u32,
    pub holidays: HolidayConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = WindowPolicy::default();
        Self {
            range: None,
            window_weeks: policy.window_weeks(),
            min_compliant_days: policy.min_compliant_days(),
            holidays: HolidayConfig::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no settings file given; using defaults");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        let settings: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// The configured range, or the default view around `today`.
    pub fn range_or_default(&self, today: CalendarDate) -> DateRange {
        self.range.unwrap_or_else(|| default_visible_range(today))
    }

    pub fn policy(&self) -> Result<WindowPolicy> {
        WindowPolicy::new(self.window_weeks, self.min_compliant_days)
            .context("invalid compliance policy")
    }
}

/// Command-line overrides shared by the validation subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Window length in weeks.
    #[arg(long)]
    pub window_weeks: Option<u32>,

    /// In-office days required per window.
    #[arg(long = "min-days")]
    pub min_compliant_days: Option<u32>,

    /// Holiday country code (e.g. US, GB). Pass an empty string for none.
    #[arg(long)]
    pub country: Option<String>,

    /// Company whose extra holidays apply.
    #[arg(long)]
    pub company: Option<String>,

    /// Holiday source.
    #[arg(long, value_enum)]
    pub source: Option<HolidaySource>,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<CalendarDate>,

    /// Last day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<CalendarDate>,
}

impl SettingsArgs {
    /// Overlay these flags onto `settings`, evaluating a partial range
    /// override against the default view around `today`.
    pub fn apply(&self, settings: &mut Settings, today: CalendarDate) -> Result<()> {
        if let Some(weeks) = self.window_weeks {
            settings.window_weeks = weeks;
        }
        if let Some(min) = self.min_compliant_days {
            settings.min_compliant_days = min;
        }
        if let Some(country) = &self.country {
            settings.holidays.selector.country_code = Some(country.clone());
        }
        if let Some(company) = &self.company {
            settings.holidays.selector.company = Some(company.clone());
        }
        if let Some(source) = self.source {
            settings.holidays.source = source;
        }
        if self.start.is_some() || self.end.is_some() {
            let base = settings.range_or_default(today);
            let range = DateRange::new(
                self.start.unwrap_or_else(|| base.start()),
                self.end.unwrap_or_else(|| base.end()),
            )
            .context("invalid --start/--end")?;
            settings.range = Some(range);
        }
        Ok(())
    }
}
