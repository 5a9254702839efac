//! # Date-State Store
//!
//! `DateStateStore` is the single owner of the state map. It enforces the
//! priority rule on unforced writes, the range constraint on every write,
//! and announces each change through a [`Broadcaster`].
//!
//! ## Notification Contract
//!
//! | Operation | Notifies |
//! |-----------|----------|
//! | `mark_date` | only when the write lands |
//! | `mark_dates` | exactly once per batch |
//! | `clear_date`, `clear_dates`, `clear_all` | always, even if nothing was removed |
//! | `set_marking_mode`, `cycle_marking_mode` | always |
//! | `set_range` | always |
//! | `subscribe` | once, to the new listener only, with the current snapshot |

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use presence_core::{
    AsCalendarDate, Broadcaster, CalendarDate, DateRange, DateState, ListenerResult, MarkingMode,
    PresenceError, Subscription,
};

/// Calendar day → state. An absent key means unmarked.
pub type StateMap = BTreeMap<CalendarDate, DateState>;

// ─── Statistics ──────────────────────────────────────────────────────

/// Per-state counts over the whole state map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Days marked `working`.
    pub working_days: usize,
    /// Days marked `oof`.
    pub oof_days: usize,
    /// Days marked `holiday`.
    pub holiday_days: usize,
    /// All marked days.
    pub total_marked_days: usize,
}

impl Statistics {
    fn tally(states: &StateMap) -> Self {
        let mut stats = Self::default();
        for state in states.values() {
            match state {
                DateState::Working => stats.working_days += 1,
                DateState::Oof => stats.oof_days += 1,
                DateState::Holiday => stats.holiday_days += 1,
            }
        }
        stats.total_marked_days = states.len();
        stats
    }
}

// ─── Snapshots and notifications ─────────────────────────────────────

/// An immutable copy of the store's state at one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    /// Every marked day.
    pub states: StateMap,
    /// The configured visible range.
    pub range: DateRange,
    /// The active marking mode.
    pub mode: MarkingMode,
    /// Counts derived from `states`.
    pub statistics: Statistics,
    /// Increments whenever `states` or `range` changes.
    pub revision: u64,
}

impl StoreSnapshot {
    /// State of `date` in this snapshot.
    pub fn state_of(&self, date: CalendarDate) -> Option<DateState> {
        self.states.get(&date).copied()
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreChange {
    /// Initial delivery to a new subscriber. Nothing changed.
    Initial,
    /// One or more days were marked.
    Marked,
    /// One or more days were cleared.
    Cleared,
    /// The marking mode changed. The state map did not.
    ModeChanged,
    /// The visible range changed.
    RangeChanged,
}

impl StoreChange {
    /// Whether results derived from the state map or range are now stale.
    pub fn invalidates_derived_state(self) -> bool {
        matches!(self, Self::Marked | Self::Cleared | Self::RangeChanged)
    }
}

/// Payload delivered to store subscribers.
#[derive(Debug, Clone)]
pub struct StoreNotification {
    /// Why the notification fired.
    pub change: StoreChange,
    /// Store state after the change.
    pub snapshot: Arc<StoreSnapshot>,
}

/// Result of a batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Days written.
    pub written: usize,
    /// Days skipped because they fell outside the range.
    pub skipped_out_of_range: usize,
}

// ─── Store ───────────────────────────────────────────────────────────

/// The date-state store.
pub struct DateStateStore {
    states: StateMap,
    range: DateRange,
    mode: MarkingMode,
    revision: u64,
    listeners: Broadcaster<StoreNotification>,
}

impl DateStateStore {
    /// Create an empty store bounded by `range`, painting `working`.
    pub fn new(range: DateRange) -> Self {
        Self {
            states: StateMap::new(),
            range,
            mode: MarkingMode::default(),
            revision: 0,
            listeners: Broadcaster::new("store"),
        }
    }

    /// The configured range.
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// The active marking mode.
    pub fn marking_mode(&self) -> MarkingMode {
        self.mode
    }

    /// Current revision; see [`StoreSnapshot::revision`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Mark a single day.
    ///
    /// Returns `Ok(true)` if the state map changed hands for this day and
    /// `Ok(false)` if an unforced write was dropped by the priority rule.
    ///
    /// # Errors
    ///
    /// - [`PresenceError::InvalidDate`] if `date` cannot be normalized.
    /// - [`PresenceError::OutOfRange`] if `date` lies outside the range.
    pub fn mark_date<D>(
        &mut self,
        date: &D,
        state: DateState,
        force: bool,
    ) -> Result<bool, PresenceError>
    where
        D: AsCalendarDate + ?Sized,
    {
        let date = date.to_calendar_date()?;
        let written = self.write(date, state, force)?;
        if written {
            self.notify(StoreChange::Marked);
        }
        Ok(written)
    }

    /// Force-mark every day in `dates` with `state`, notifying once.
    ///
    /// Days outside the range are skipped. Every date is normalized before
    /// any write, so an unparsable entry aborts the batch with the store
    /// untouched.
    pub fn mark_dates<I, D>(&mut self, dates: I, state: DateState) -> Result<BatchOutcome, PresenceError>
    where
        I: IntoIterator<Item = D>,
        D: AsCalendarDate,
    {
        let dates = normalize_all(dates)?;

        let mut outcome = BatchOutcome::default();
        for date in dates {
            match self.write(date, state, true) {
                Ok(_) => outcome.written += 1,
                Err(e) if e.is_out_of_range() => {
                    tracing::debug!(%date, "batch mark skipped out-of-range date");
                    outcome.skipped_out_of_range += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            %state,
            written = outcome.written,
            skipped = outcome.skipped_out_of_range,
            "batch mark applied"
        );
        self.notify(StoreChange::Marked);
        Ok(outcome)
    }

    /// Paint `date` with the active marking mode.
    ///
    /// A day already holding the mode's state is cleared; anything else is
    /// force-marked. Returns the day's new state.
    pub fn apply_marking_mode<D>(&mut self, date: &D) -> Result<Option<DateState>, PresenceError>
    where
        D: AsCalendarDate + ?Sized,
    {
        let date = date.to_calendar_date()?;
        self.check_range(date)?;

        let target = self.mode.state();
        if self.states.get(&date) == Some(&target) {
            self.states.remove(&date);
            self.notify(StoreChange::Cleared);
            Ok(None)
        } else {
            self.states.insert(date, target);
            self.notify(StoreChange::Marked);
            Ok(Some(target))
        }
    }

    /// Remove one day's mark. Always notifies.
    ///
    /// Returns the state that was removed, if any.
    pub fn clear_date<D>(&mut self, date: &D) -> Result<Option<DateState>, PresenceError>
    where
        D: AsCalendarDate + ?Sized,
    {
        let date = date.to_calendar_date()?;
        let removed = self.states.remove(&date);
        self.notify(StoreChange::Cleared);
        Ok(removed)
    }

    /// Remove the marks of every day in `dates`, notifying once.
    ///
    /// Returns the number of marks removed.
    pub fn clear_dates<I, D>(&mut self, dates: I) -> Result<usize, PresenceError>
    where
        I: IntoIterator<Item = D>,
        D: AsCalendarDate,
    {
        let dates = normalize_all(dates)?;
        let removed = dates
            .iter()
            .filter(|d| self.states.remove(*d).is_some())
            .count();
        self.notify(StoreChange::Cleared);
        Ok(removed)
    }

    /// Remove every mark. Always notifies.
    ///
    /// Returns the number of marks removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.states.len();
        self.states.clear();
        self.notify(StoreChange::Cleared);
        removed
    }

    /// Replace the visible range.
    ///
    /// Marks outside the new range are kept; they can no longer be written.
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
        self.notify(StoreChange::RangeChanged);
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// State of one day, `None` if unmarked.
    pub fn get_date_state<D>(&self, date: &D) -> Result<Option<DateState>, PresenceError>
    where
        D: AsCalendarDate + ?Sized,
    {
        let date = date.to_calendar_date()?;
        Ok(self.states.get(&date).copied())
    }

    /// Counts recomputed from the current state map.
    pub fn statistics(&self) -> Statistics {
        Statistics::tally(&self.states)
    }

    /// An independent copy of the current state.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::new(StoreSnapshot {
            states: self.states.clone(),
            range: self.range,
            mode: self.mode,
            statistics: self.statistics(),
            revision: self.revision,
        })
    }

    // ── Marking mode ────────────────────────────────────────────────

    /// Set the active marking mode.
    pub fn set_marking_mode(&mut self, mode: MarkingMode) {
        self.mode = mode;
        self.notify(StoreChange::ModeChanged);
    }

    /// Advance `working → oof → holiday → working` and return the new mode.
    pub fn cycle_marking_mode(&mut self) -> MarkingMode {
        self.mode = self.mode.next();
        self.notify(StoreChange::ModeChanged);
        self.mode
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Register a listener.
    ///
    /// The listener runs once immediately with [`StoreChange::Initial`] and
    /// the current snapshot, then after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreNotification) -> ListenerResult + Send + Sync + 'static,
    {
        let initial = StoreNotification {
            change: StoreChange::Initial,
            snapshot: self.snapshot(),
        };
        self.listeners.subscribe_with_initial(listener, &initial)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }

    // ── Internals ───────────────────────────────────────────────────

    fn check_range(&self, date: CalendarDate) -> Result<(), PresenceError> {
        if self.range.contains(date) {
            Ok(())
        } else {
            Err(PresenceError::OutOfRange {
                date,
                range: self.range,
            })
        }
    }

    /// Apply one write without notifying.
    fn write(&mut self, date: CalendarDate, state: DateState, force: bool) -> Result<bool, PresenceError> {
        self.check_range(date)?;

        if !force {
            if let Some(existing) = self.states.get(&date) {
                if !existing.yields_to(state) {
                    tracing::debug!(
                        %date,
                        existing = %existing,
                        requested = %state,
                        "unforced write rejected by priority"
                    );
                    return Ok(false);
                }
            }
        }

        self.states.insert(date, state);
        tracing::trace!(%date, %state, force, "date marked");
        Ok(true)
    }

    fn notify(&mut self, change: StoreChange) {
        if change.invalidates_derived_state() {
            self.revision += 1;
        }
        let notification = StoreNotification {
            change,
            snapshot: self.snapshot(),
        };
        self.listeners.dispatch(&notification);
    }
}

impl std::fmt::Debug for DateStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateStateStore")
            .field("range", &self.range)
            .field("mode", &self.mode)
            .field("marked", &self.states.len())
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.listener_count())
            .finish()
    }
}

fn normalize_all<I, D>(dates: I) -> Result<Vec<CalendarDate>, PresenceError>
where
    I: IntoIterator<Item = D>,
    D: AsCalendarDate,
{
    dates.into_iter().map(|d| d.to_calendar_date()).collect()
}
