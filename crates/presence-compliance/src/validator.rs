//! # Window Validator — Rolling In-Office Compliance
//!
//! Slides a window of `window_weeks * 7` calendar days across the visible
//! range, one week per step, and checks each window against a minimum
//! number of in-office days.
//!
//! ## Counting Rules
//!
//! For each day in a window:
//!
//! | Day | Denominator | Numerator |
//! |-----|-------------|-----------|
//! | Saturday / Sunday | no | no |
//! | In the exclusion set | no | no |
//! | Marked `holiday` | no | no |
//! | Marked `working` | yes | yes |
//! | Marked `oof` or unmarked | yes | no |
//!
//! ## Window Placement
//!
//! The first window starts on the range's first day. A window whose last
//! day would fall after the range's last day is not evaluated, so a range
//! shorter than one window is trivially compliant.
//!
//! [`validate`] stops at the first non-compliant window. [`scan_windows`]
//! evaluates every window for reporting. Neither keeps state between runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use presence_core::{is_weekday, CalendarDate, DateRange, DateState};
use presence_holiday::HolidaySet;
use presence_store::StateMap;

/// Days per window step.
const STEP_DAYS: u64 = 7;

// ─── Policy ──────────────────────────────────────────────────────────

/// Policy construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A window must span at least one week.
    #[error("window length must be at least one week")]
    ZeroWindow,
}

/// Window length and per-window threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindowPolicy")]
pub struct WindowPolicy {
    window_weeks: u32,
    min_compliant_days: u32,
}

#[derive(Deserialize)]
struct RawWindowPolicy {
    window_weeks: u32,
    min_compliant_days: u32,
}

impl TryFrom<RawWindowPolicy> for WindowPolicy {
    type Error = PolicyError;

    fn try_from(raw: RawWindowPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.window_weeks, raw.min_compliant_days)
    }
}

impl WindowPolicy {
    /// A policy of `window_weeks` weeks requiring `min_compliant_days`
    /// in-office days per window.
    ///
    /// # Errors
    ///
    /// [`PolicyError::ZeroWindow`] if `window_weeks` is zero.
    pub fn new(window_weeks: u32, min_compliant_days: u32) -> Result<Self, PolicyError> {
        if window_weeks == 0 {
            return Err(PolicyError::ZeroWindow);
        }
        Ok(Self {
            window_weeks,
            min_compliant_days,
        })
    }

    pub fn window_weeks(&self) -> u32 {
        self.window_weeks
    }

    pub fn min_compliant_days(&self) -> u32 {
        self.min_compliant_days
    }

    /// Window length in calendar days.
    pub fn window_days(&self) -> u64 {
        u64::from(self.window_weeks) * STEP_DAYS
    }
}

impl Default for WindowPolicy {
    /// Twelve weeks, three days a week.
    fn default() -> Self {
        Self {
            window_weeks: 12,
            min_compliant_days: 36,
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────

/// One evaluated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceWindow {
    /// First day of the window.
    pub start_date: CalendarDate,
    /// Last day of the window, inclusive.
    pub end_date: CalendarDate,
    /// Weekdays that count toward the denominator.
    pub weekdays_in_window: u32,
    /// Weekdays marked `working`.
    pub compliant_days: u32,
    /// `compliant_days >= min_compliant_days`.
    pub is_compliant: bool,
}

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether every evaluated window is compliant.
    pub is_valid: bool,
    /// Human-readable summary.
    pub message: String,
    /// The chronologically first non-compliant window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violating_window: Option<ComplianceWindow>,
    /// Windows examined before the run finished.
    pub windows_evaluated: usize,
}

// ─── Scan ────────────────────────────────────────────────────────────

/// `(start, end)` of every window that fits inside `range`, in order.
fn window_spans(range: &DateRange, policy: &WindowPolicy) -> impl Iterator<Item = (CalendarDate, CalendarDate)> {
    let last = range.end();
    // No spans for an empty window.
    let span = policy.window_days().checked_sub(1);
    let mut next_start = span.map(|_| range.start());
    std::iter::from_fn(move || {
        let start = next_start?;
        let end = start.checked_add_days(span?).filter(|end| *end <= last)?;
        next_start = start.checked_add_days(STEP_DAYS);
        Some((start, end))
    })
}

/// `n` followed by `noun`, pluralised.
fn count<T: std::fmt::Display + PartialEq + From<u8>>(n: T, noun: &str) -> String {
    let suffix = if n == T::from(1) { "" } else { "s" };
    format!("{n} {noun}{suffix}")
}

fn evaluate_window(
    states: &StateMap,
    exclusions: &HolidaySet,
    policy: &WindowPolicy,
    start: CalendarDate,
    end: CalendarDate,
) -> ComplianceWindow {
    let mut weekdays_in_window = 0;
    let mut compliant_days = 0;

    let mut day = Some(start);
    while let Some(current) = day.filter(|d| *d <= end) {
        let state = states.get(&current).copied();
        let excluded = exclusions.contains(&current) || state == Some(DateState::Holiday);
        if is_weekday(current) && !excluded {
            weekdays_in_window += 1;
            if state.is_some_and(DateState::is_in_office) {
                compliant_days += 1;
            }
        }
        day = current.checked_add_days(1);
    }

    ComplianceWindow {
        start_date: start,
        end_date: end,
        weekdays_in_window,
        compliant_days,
        is_compliant: compliant_days >= policy.min_compliant_days,
    }
}

/// Evaluate every window in `range`, without early exit.
pub fn scan_windows(
    states: &StateMap,
    range: &DateRange,
    exclusions: &HolidaySet,
    policy: &WindowPolicy,
) -> Vec<ComplianceWindow> {
    window_spans(range, policy)
        .map(|(start, end)| evaluate_window(states, exclusions, policy, start, end))
        .collect()
}

/// Validate `states` against `policy`, stopping at the first violation.
pub fn validate(
    states: &StateMap,
    range: &DateRange,
    exclusions: &HolidaySet,
    policy: &WindowPolicy,
) -> ValidationResult {
    let mut windows_evaluated = 0;
    for (start, end) in window_spans(range, policy) {
        let window = evaluate_window(states, exclusions, policy, start, end);
        windows_evaluated += 1;
        if !window.is_compliant {
            tracing::debug!(
                start = %window.start_date,
                end = %window.end_date,
                compliant = window.compliant_days,
                required = policy.min_compliant_days,
                windows_evaluated,
                "compliance violation"
            );
            return ValidationResult {
                is_valid: false,
                message: format!(
                    "Window {} to {} has {} of the {} required",
                    window.start_date,
                    window.end_date,
                    count(window.compliant_days, "in-office day"),
                    policy.min_compliant_days
                ),
                violating_window: Some(window),
                windows_evaluated,
            };
        }
    }

    let message = if windows_evaluated == 0 {
        format!(
            "No complete {}-week window fits in {range}; nothing to validate",
            policy.window_weeks
        )
    } else {
        format!(
            "{} of {} {} the minimum of {}",
            count(windows_evaluated, "window"),
            count(policy.window_weeks, "week"),
            if windows_evaluated == 1 { "meets" } else { "all meet" },
            count(policy.min_compliant_days, "in-office day")
        )
    };
    tracing::debug!(windows_evaluated, "compliance validation passed");
    ValidationResult {
        is_valid: true,
        message,
        violating_window: None,
        windows_evaluated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(d(start), d(end)).unwrap()
    }

    fn working(days: &[&str]) -> StateMap {
        days.iter().map(|s| (d(s), DateState::Working)).collect()
    }

    fn policy(weeks: u32, min: u32) -> WindowPolicy {
        WindowPolicy::new(weeks, min).unwrap()
    }

    // ---- policy ----

    #[test]
    fn zero_week_policy_is_rejected() {
        assert_eq!(WindowPolicy::new(0, 3), Err(PolicyError::ZeroWindow));
        assert_eq!(policy(2, 0).window_days(), 14);
    }

    #[test]
    fn default_policy_is_three_days_a_week_over_twelve_weeks() {
        let p = WindowPolicy::default();
        assert_eq!((p.window_weeks(), p.min_compliant_days()), (12, 36));
    }

    #[test]
    fn deserialized_policy_goes_through_validation() {
        let err = serde_json::from_str::<WindowPolicy>(r#"{"window_weeks":0,"min_compliant_days":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("at least one week"));

        let parsed: WindowPolicy =
            serde_json::from_str(r#"{"window_weeks":4,"min_compliant_days":12}"#).unwrap();
        assert_eq!(parsed, policy(4, 12));
        assert_eq!(serde_json::to_value(parsed).unwrap()["window_weeks"], 4);
    }

    #[test]
    fn empty_window_yields_no_spans() {
        let empty = WindowPolicy {
            window_weeks: 0,
            min_compliant_days: 3,
        };
        assert_eq!(window_spans(&range("2026-02-01", "2026-02-28"), &empty).count(), 0);
        let result = validate(&StateMap::new(), &range("2026-02-01", "2026-02-28"), &HolidaySet::new(), &empty);
        assert!(result.is_valid);
        assert_eq!(result.windows_evaluated, 0);
    }

    #[test]
    fn summary_messages_are_pluralised() {
        let one = validate(
            &working(&["2026-02-02"]),
            &range("2026-02-01", "2026-02-07"),
            &HolidaySet::new(),
            &policy(1, 1),
        );
        assert_eq!(one.message, "1 window of 1 week meets the minimum of 1 in-office day");

        let many = validate(
            &working(&["2026-02-02", "2026-02-03", "2026-02-09", "2026-02-10"]),
            &range("2026-02-01", "2026-02-14"),
            &HolidaySet::new(),
            &policy(1, 2),
        );
        assert_eq!(many.message, "2 windows of 1 week all meet the minimum of 2 in-office days");
    }

    // ---- window placement ----

    #[test]
    fn windows_step_one_week_and_never_overrun() {
        // 2026-02-01..=2026-02-28 is exactly four weeks.
        let spans: Vec<_> = window_spans(&range("2026-02-01", "2026-02-28"), &policy(2, 0)).collect();
        assert_eq!(
            spans,
            vec![
                (d("2026-02-01"), d("2026-02-14")),
                (d("2026-02-08"), d("2026-02-21")),
                (d("2026-02-15"), d("2026-02-28")),
            ]
        );
    }

    #[test]
    fn range_shorter_than_a_window_is_trivially_compliant() {
        let result = validate(
            &StateMap::new(),
            &range("2026-02-01", "2026-02-10"),
            &HolidaySet::new(),
            &policy(2, 5),
        );
        assert!(result.is_valid);
        assert_eq!(result.windows_evaluated, 0);
        assert!(result.violating_window.is_none());
    }

    #[test]
    fn zero_minimum_is_always_compliant() {
        let result = validate(
            &StateMap::new(),
            &range("2026-02-01", "2026-02-28"),
            &HolidaySet::new(),
            &policy(1, 0),
        );
        assert!(result.is_valid);
        assert_eq!(result.windows_evaluated, 4);
    }

    // ---- counting ----

    #[test]
    fn weekends_and_non_working_states_do_not_count() {
        let mut states = working(&["2026-02-02", "2026-02-07", "2026-02-08"]);
        states.insert(d("2026-02-03"), DateState::Oof);
        let window = evaluate_window(
            &states,
            &HolidaySet::new(),
            &policy(1, 1),
            d("2026-02-02"),
            d("2026-02-08"),
        );
        assert_eq!(window.weekdays_in_window, 5);
        assert_eq!(window.compliant_days, 1);
        assert!(window.is_compliant);
    }

    #[test]
    fn excluded_and_holiday_marked_days_leave_the_denominator() {
        let mut states = working(&["2026-02-02", "2026-02-03"]);
        states.insert(d("2026-02-04"), DateState::Holiday);
        // The exclusion also covers a day marked working.
        let exclusions: HolidaySet = [d("2026-02-03"), d("2026-02-05")].into_iter().collect();
        let window = evaluate_window(&states, &exclusions, &policy(1, 1), d("2026-02-02"), d("2026-02-08"));
        assert_eq!(window.weekdays_in_window, 2);
        assert_eq!(window.compliant_days, 1);
    }

    // ---- results ----

    #[test]
    fn failure_message_names_the_window() {
        let result = validate(
            &working(&["2026-02-02"]),
            &range("2026-02-01", "2026-02-07"),
            &HolidaySet::new(),
            &policy(1, 3),
        );
        assert!(!result.is_valid);
        assert_eq!(
            result.message,
            "Window 2026-02-01 to 2026-02-07 has 1 in-office day of the 3 required"
        );
    }

    #[test]
    fn result_serializes_with_snake_case_fields() {
        let result = validate(
            &StateMap::new(),
            &range("2026-02-01", "2026-02-07"),
            &HolidaySet::new(),
            &policy(1, 1),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["violating_window"]["start_date"], "2026-02-01");
        assert_eq!(json["violating_window"]["weekdays_in_window"], 5);
    }

    // ---- properties ----

    fn arb_states() -> impl Strategy<Value = StateMap> {
        proptest::collection::btree_map(
            (0u64..90).prop_map(|offset| d("2026-01-05").checked_add_days(offset).unwrap()),
            prop_oneof![
                Just(DateState::Working),
                Just(DateState::Oof),
                Just(DateState::Holiday)
            ],
            0..70,
        )
    }

    proptest! {
        #[test]
        fn early_exit_reports_first_failing_window_of_full_scan(
            states in arb_states(),
            weeks in 1u32..5,
            min in 0u32..12,
        ) {
            let r = range("2026-01-05", "2026-04-04");
            let p = policy(weeks, min);
            let all = scan_windows(&states, &r, &HolidaySet::new(), &p);
            let result = validate(&states, &r, &HolidaySet::new(), &p);

            let first_failure = all.iter().position(|w| !w.is_compliant);
            prop_assert_eq!(result.is_valid, first_failure.is_none());
            prop_assert_eq!(result.violating_window, first_failure.map(|i| all[i]));
            prop_assert_eq!(result.windows_evaluated, first_failure.map_or(all.len(), |i| i + 1));
        }

        #[test]
        fn compliant_days_never_exceed_weekdays(states in arb_states(), weeks in 1u32..5) {
            let r = range("2026-01-05", "2026-04-04");
            for w in scan_windows(&states, &r, &HolidaySet::new(), &policy(weeks, 0)) {
                prop_assert!(w.compliant_days <= w.weekdays_in_window);
                prop_assert!(w.weekdays_in_window <= weeks * 5);
                prop_assert!(w.end_date <= r.end());
            }
        }
    }
}
