//! Session cache for holiday providers.
//!
//! Repeated calls with the same selector return the same set without
//! touching the wrapped provider. Errors are not cached, so a transient
//! network failure is retried on the next call.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::HolidayError;
use crate::provider::{normalize_country, HolidayProvider, HolidaySet};

/// (country, company, sorted distinct years, weekdays_only)
type CacheKey = (String, String, Vec<i32>, bool);

/// Memoizing wrapper around any [`HolidayProvider`].
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    entries: Mutex<HashMap<CacheKey, HolidaySet>>,
}

impl<P> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached selectors.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn cache_key(country_code: &str, company: Option<&str>, years: &[i32], weekdays_only: bool) -> CacheKey {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();
    (
        normalize_country(country_code),
        company.map(|c| c.trim().to_lowercase()).unwrap_or_default(),
        years,
        weekdays_only,
    )
}

impl<P: HolidayProvider> HolidayProvider for CachedProvider<P> {
    async fn holiday_dates(
        &self,
        country_code: &str,
        company: Option<&str>,
        years: &[i32],
        weekdays_only: bool,
    ) -> Result<HolidaySet, HolidayError> {
        let key = cache_key(country_code, company, years, weekdays_only);
        let cached = self.entries.lock().get(&key).cloned();
        if let Some(dates) = cached {
            tracing::trace!(country = %key.0, years = ?key.2, "holiday cache hit");
            return Ok(dates);
        }

        let dates = self
            .inner
            .holiday_dates(country_code, company, years, weekdays_only)
            .await?;
        self.entries.lock().insert(key, dates.clone());
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use presence_core::CalendarDate;

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl HolidayProvider for CountingProvider {
        async fn holiday_dates(
            &self,
            country_code: &str,
            _company: Option<&str>,
            years: &[i32],
            _weekdays_only: bool,
        ) -> Result<HolidaySet, HolidayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HolidayError::UnknownCountry(country_code.to_string()));
            }
            Ok(years
                .iter()
                .map(|y| CalendarDate::from_ymd(*y, 1, 1).unwrap())
                .collect())
        }
    }

    #[tokio::test]
    async fn equivalent_selectors_share_one_lookup() {
        let cached = CachedProvider::new(CountingProvider::default());

        let first = cached.holiday_dates("us", Some("Acme"), &[2027, 2026], true).await.unwrap();
        let second = cached.holiday_dates(" US ", Some("acme"), &[2026, 2027, 2026], true).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn different_selectors_are_cached_separately() {
        let cached = CachedProvider::new(CountingProvider::default());
        cached.holiday_dates("US", None, &[2026], true).await.unwrap();
        cached.holiday_dates("US", None, &[2026], false).await.unwrap();
        cached.holiday_dates("GB", None, &[2026], true).await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 3);

        cached.clear();
        assert!(cached.is_empty());
        cached.holiday_dates("US", None, &[2026], true).await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedProvider::new(CountingProvider {
            fail: true,
            ..Default::default()
        });
        assert!(cached.holiday_dates("US", None, &[2026], true).await.is_err());
        assert!(cached.holiday_dates("US", None, &[2026], true).await.is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }
}
