//! # Holiday Sync — Settings Changed → Holidays Applied
//!
//! The event boundary between holiday configuration and the store. When
//! the holiday selector changes, [`HolidaySync`]:
//!
//! 1. resolves the new holiday set through its provider (async; a failed
//!    lookup degrades to an empty set with a warning),
//! 2. discards the resolution if a newer one was started meanwhile,
//! 3. clears the holidays it applied last time (only days still marked
//!    `holiday`) and emits [`HolidayEvent::Removed`],
//! 4. force-marks the new holidays and emits [`HolidayEvent::Applied`].
//!
//! Resolution and application are separate steps so that no store borrow
//! is held across the provider's await point.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use presence_core::{
    Broadcaster, CalendarDate, DateRange, DateState, ListenerResult, PresenceError, Subscription,
};
use presence_holiday::{HolidayProvider, HolidaySet};
use presence_store::DateStateStore;

/// Holiday selector carried by a settings-changed signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidaySettings {
    /// ISO 3166-1 alpha-2 code. `None` or blank means no holidays.
    pub country_code: Option<String>,
    /// Company whose extra days apply, where the source supports them.
    pub company: Option<String>,
    /// Drop holidays falling on a weekend.
    pub weekdays_only: bool,
}

impl Default for HolidaySettings {
    fn default() -> Self {
        Self {
            country_code: None,
            company: None,
            weekdays_only: true,
        }
    }
}

impl HolidaySettings {
    /// The selected country, trimmed, if any.
    pub fn country(&self) -> Option<&str> {
        self.country_code.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// The selected company, trimmed, if any.
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Signals emitted when holiday marks change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidayEvent {
    /// Previously applied holiday marks were cleared.
    Removed {
        /// Days whose `holiday` mark was removed.
        dates: Vec<CalendarDate>,
    },
    /// A new holiday set was marked.
    Applied {
        /// Every resolved holiday, including skipped ones.
        dates: Vec<CalendarDate>,
        /// Resolved holidays outside the store's range.
        skipped_out_of_range: usize,
    },
}

/// A provider answer waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    generation: u64,
    dates: HolidaySet,
}

impl Resolution {
    pub fn dates(&self) -> &HolidaySet {
        &self.dates
    }
}

/// Applies provider holidays to a store on settings change.
pub struct HolidaySync<P> {
    provider: P,
    generation: AtomicU64,
    applied: Mutex<HolidaySet>,
    events: Broadcaster<HolidayEvent>,
}

impl<P: HolidayProvider> HolidaySync<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            generation: AtomicU64::new(0),
            applied: Mutex::new(HolidaySet::new()),
            events: Broadcaster::new("holidays"),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve holidays for `settings` over the years `range` touches.
    ///
    /// Starting a resolution makes every earlier one stale. Never fails: a
    /// provider error is logged and yields an empty set.
    pub async fn resolve(&self, settings: &HolidaySettings, range: &DateRange) -> Resolution {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(country) = settings.country() else {
            tracing::debug!(generation, "no country selected; holiday set is empty");
            return Resolution {
                generation,
                dates: HolidaySet::new(),
            };
        };

        let years = range.years();
        let dates = match self
            .provider
            .holiday_dates(country, settings.company(), &years, settings.weekdays_only)
            .await
        {
            Ok(dates) => dates,
            Err(e) => {
                tracing::warn!(
                    country,
                    company = settings.company().unwrap_or(""),
                    years = ?years,
                    error = %e,
                    "holiday lookup failed; continuing without exclusions"
                );
                HolidaySet::new()
            }
        };

        Resolution { generation, dates }
    }

    /// Apply a resolution to `store`.
    ///
    /// Returns `Ok(false)` without touching the store if a newer resolution
    /// has been started since this one.
    pub fn apply(&self, store: &mut DateStateStore, resolution: Resolution) -> Result<bool, PresenceError> {
        let current = self.generation.load(Ordering::SeqCst);
        if resolution.generation != current {
            tracing::debug!(
                generation = resolution.generation,
                current,
                "discarding stale holiday resolution"
            );
            return Ok(false);
        }

        let previous = std::mem::take(&mut *self.applied.lock());
        let removed: Vec<CalendarDate> = previous
            .into_iter()
            .filter(|d| matches!(store.get_date_state(d), Ok(Some(DateState::Holiday))))
            .collect();
        if !removed.is_empty() {
            store.clear_dates(&removed)?;
            tracing::debug!(count = removed.len(), "previous holidays removed");
            self.events.dispatch(&HolidayEvent::Removed { dates: removed });
        }

        let outcome = store.mark_dates(&resolution.dates, DateState::Holiday)?;
        tracing::info!(
            applied = outcome.written,
            skipped = outcome.skipped_out_of_range,
            "holidays applied"
        );
        let dates: Vec<CalendarDate> = resolution.dates.iter().copied().collect();
        *self.applied.lock() = resolution.dates;
        self.events.dispatch(&HolidayEvent::Applied {
            dates,
            skipped_out_of_range: outcome.skipped_out_of_range,
        });
        Ok(true)
    }

    /// Handle a settings-changed signal end to end.
    pub async fn handle_settings_changed(
        &self,
        store: &mut DateStateStore,
        settings: &HolidaySettings,
    ) -> Result<bool, PresenceError> {
        let range = store.range();
        let resolution = self.resolve(settings, &range).await;
        self.apply(store, resolution)
    }

    /// The holiday set currently applied, for use as validation exclusions.
    pub fn exclusions(&self) -> HolidaySet {
        self.applied.lock().clone()
    }

    /// Listen for [`HolidayEvent`]s.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&HolidayEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }
}

impl<P> std::fmt::Debug for HolidaySync<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolidaySync")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("applied", &self.applied.lock().len())
            .finish()
    }
}
