//! # Session Assembly
//!
//! Builds the store for one CLI run: range from settings, holidays applied
//! through [`HolidaySync`], then the user's marks from a YAML file.
//!
//! Marks file format, one day per key:
//!
//! ```yaml
//! 2026-02-02: working
//! 2026-02-03: oof
//! 2026-02-16: holiday
//! ```
//!
//! Marks are written without force, so a configured holiday is never
//! downgraded by a `working` or `oof` entry.

use std::path::Path;

use anyhow::{Context, Result};

use presence_compliance::{HolidaySync, WindowPolicy};
use presence_core::CalendarDate;
use presence_holiday::HolidaySet;
use presence_store::{DateStateStore, StateMap};

use crate::settings::Settings;

/// Outcome of writing a marks file into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarksOutcome {
    /// Entries written.
    pub written: usize,
    /// Entries dropped because a higher-priority state was already there.
    pub superseded: usize,
    /// Entries outside the range.
    pub out_of_range: usize,
}

/// Read a marks file.
pub fn load_marks(path: &Path) -> Result<StateMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read marks file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(StateMap::new());
    }
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse marks file: {}", path.display()))
}

/// Write `marks` into `store` with unforced writes.
pub fn apply_marks(store: &mut DateStateStore, marks: &StateMap) -> Result<MarksOutcome> {
    let mut outcome = MarksOutcome::default();
    for (date, state) in marks {
        match store.mark_date(date, *state, false) {
            Ok(true) => outcome.written += 1,
            Ok(false) => outcome.superseded += 1,
            Err(e) if e.is_out_of_range() => {
                tracing::warn!(%date, range = %store.range(), "mark outside the range ignored");
                outcome.out_of_range += 1;
            }
            Err(e) => return Err(e).context("failed to apply marks"),
        }
    }
    Ok(outcome)
}

/// Everything a validation subcommand needs.
#[derive(Debug)]
pub struct Session {
    pub store: DateStateStore,
    pub exclusions: HolidaySet,
    pub policy: WindowPolicy,
    pub marks: MarksOutcome,
}

/// Assemble a session from settings and an optional marks file.
pub async fn prepare(settings: &Settings, marks: Option<&Path>, today: CalendarDate) -> Result<Session> {
    let policy = settings.policy()?;
    let range = settings.range_or_default(today);
    let mut store = DateStateStore::new(range);

    let provider = settings.holidays.provider()?;
    tracing::debug!(source = provider.name(), %range, "resolving holidays");
    let sync = HolidaySync::new(provider);
    sync.handle_settings_changed(&mut store, &settings.holidays.selector)
        .await
        .context("failed to apply holidays")?;

    let marks = match marks {
        Some(path) => apply_marks(&mut store, &load_marks(path)?)?,
        None => MarksOutcome::default(),
    };
    tracing::info!(
        written = marks.written,
        superseded = marks.superseded,
        out_of_range = marks.out_of_range,
        "marks applied"
    );

    Ok(Session {
        store,
        exclusions: sync.exclusions(),
        policy,
        marks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::{DateRange, DateState};

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn marks_file(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn marks_file_parses_states() {
        let file = marks_file("2026-02-02: working\n2026-02-03: oof\n'2026-02-04': holiday\n");
        let marks = load_marks(file.path()).unwrap();
        assert_eq!(marks.len(), 3);
        assert_eq!(marks[&d("2026-02-03")], DateState::Oof);
    }

    #[test]
    fn empty_marks_file_is_no_marks() {
        let file = marks_file("\n");
        assert!(load_marks(file.path()).unwrap().is_empty());
    }

    #[test]
    fn bad_marks_are_reported_with_the_path() {
        let file = marks_file("2026-02-30: working\n");
        let err = load_marks(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse marks file"));

        let file = marks_file("2026-02-02: remote\n");
        assert!(load_marks(file.path()).is_err());
    }

    #[test]
    fn marks_respect_priority_and_range() {
        let mut store = DateStateStore::new(DateRange::new(d("2026-02-01"), d("2026-02-28")).unwrap());
        store.mark_date("2026-02-16", DateState::Holiday, false).unwrap();

        let marks: StateMap = [
            (d("2026-02-02"), DateState::Working),
            (d("2026-02-16"), DateState::Working),
            (d("2026-03-02"), DateState::Working),
        ]
        .into_iter()
        .collect();
        let outcome = apply_marks(&mut store, &marks).unwrap();

        assert_eq!(
            outcome,
            MarksOutcome {
                written: 1,
                superseded: 1,
                out_of_range: 1
            }
        );
        assert_eq!(store.get_date_state("2026-02-16").unwrap(), Some(DateState::Holiday));
    }

    #[tokio::test]
    async fn prepare_applies_holidays_before_marks() {
        let mut settings = Settings::default();
        settings.range = Some(DateRange::new(d("2026-06-29"), d("2026-07-05")).unwrap());
        settings.holidays.selector.country_code = Some("US".into());
        let file = marks_file("2026-07-02: working\n2026-07-03: working\n");

        let session = prepare(&settings, Some(file.path()), d("2026-07-01")).await.unwrap();
        assert_eq!(session.store.get_date_state("2026-07-03").unwrap(), Some(DateState::Holiday));
        assert!(session.exclusions.contains(&d("2026-07-03")));
        assert_eq!(session.marks.written, 1);
        assert_eq!(session.marks.superseded, 1);
    }
}
