//! # Holidays Subcommand
//!
//! ```bash
//! presence holidays --country US --year 2026
//! presence holidays --country GB --year 2026 --year 2027 --include-weekends
//! presence holidays --country DE --year 2026 --source nager
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use presence_holiday::HolidayProvider;

use crate::settings::{build_provider, HolidaySource, Settings};

/// Arguments for `holidays`.
#[derive(Args, Debug, Clone)]
pub struct HolidaysArgs {
    /// Country code (e.g. US, GB, DE, CA).
    #[arg(long)]
    pub country: String,

    /// Company whose extra holidays apply.
    #[arg(long)]
    pub company: Option<String>,

    /// Calendar year; repeat for several.
    #[arg(long = "year", required = true)]
    pub years: Vec<i32>,

    /// Holiday source. Defaults to the settings file, then `builtin`.
    #[arg(long, value_enum)]
    pub source: Option<HolidaySource>,

    /// Also list holidays falling on Saturday or Sunday.
    #[arg(long)]
    pub include_weekends: bool,
}

/// Execute `holidays`.
pub async fn run_holidays(args: &HolidaysArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    let source = args.source.unwrap_or(settings.holidays.source);
    let provider = build_provider(source, &settings.holidays.custom_calendars)?;

    let dates = provider
        .holiday_dates(&args.country, args.company.as_deref(), &args.years, !args.include_weekends)
        .await
        .with_context(|| format!("failed to resolve holidays for {:?}", args.country))?;

    for date in &dates {
        println!("{date}  {}", date.weekday());
    }
    println!();
    println!("{} holidays ({} source)", dates.len(), provider.name());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(country: &str) -> HolidaysArgs {
        HolidaysArgs {
            country: country.into(),
            company: None,
            years: vec![2026],
            source: Some(HolidaySource::Builtin),
            include_weekends: false,
        }
    }

    #[tokio::test]
    async fn builtin_country_lists_holidays() {
        assert_eq!(run_holidays(&args("US"), None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_country_is_an_error() {
        let err = run_holidays(&args("ZZ"), None).await.unwrap_err();
        assert!(format!("{err:#}").contains("no holiday calendar"));
    }

    #[tokio::test]
    async fn custom_calendar_from_settings_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "holidays:\n  custom_calendars:\n    - country_code: IE\n      rules:\n        - fixed: { month: 3, day: 17 }\n",
        )
        .unwrap();
        assert_eq!(run_holidays(&args("IE"), Some(file.path())).await.unwrap(), 0);
    }
}
