//! Runtime choice between holiday sources.

use presence_holiday::{
    CachedProvider, HolidayError, HolidayProvider, HolidaySet, NagerHolidayProvider,
    RuleBasedProvider,
};

/// The holiday source selected by configuration.
#[derive(Debug)]
pub enum SourceProvider {
    Builtin(RuleBasedProvider),
    Nager(CachedProvider<NagerHolidayProvider>),
}

impl SourceProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Builtin(_) => "builtin",
            Self::Nager(_) => "nager",
        }
    }
}

impl HolidayProvider for SourceProvider {
    async fn holiday_dates(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> Result<HolidaySet, HolidayError> {
        match self {
            Self::Builtin(p) => p.holiday_dates(country_code, company, years, weekdays_only).await,
            Self::Nager(p) => p.holiday_dates(country_code, company, years, weekdays_only).await,
        }
    }
}
