//! # Error Hierarchy
//!
//! Structured error types for the presence core, built with `thiserror`.
//!
//! The three kinds callers branch on are distinct variants rather than
//! message text:
//!
//! - `InvalidDate` is always propagated to the caller.
//! - `OutOfRange` is surfaced by single-date writes and skipped by batch
//!   writes. Batch code tests for it with [`PresenceError::is_out_of_range`].
//! - `InvalidMode` is a programming defect and is fatal to the triggering call.

use thiserror::Error;

use crate::date::{CalendarDate, DateRange};

/// Top-level error type for the presence core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresenceError {
    /// Input could not be normalized to a `YYYY-MM-DD` calendar date.
    #[error("invalid date {input:?}: {reason}")]
    InvalidDate {
        /// The raw input as received.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The date is valid but lies outside the store's configured range.
    #[error("date {date} is outside the configured range {range}")]
    OutOfRange {
        /// The normalized date that was rejected.
        date: CalendarDate,
        /// The range in force when the write was attempted.
        range: DateRange,
    },

    /// A marking mode outside the `working → oof → holiday` cycle.
    #[error("unrecognized marking mode: {0:?}")]
    InvalidMode(String),

    /// A state name outside `working`, `oof`, `holiday`.
    #[error("unrecognized date state: {0:?}")]
    InvalidState(String),

    /// A date range whose start is after its end.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start.
        start: CalendarDate,
        /// Requested end.
        end: CalendarDate,
    },
}

impl PresenceError {
    /// Whether this error is a range violation.
    ///
    /// Batch writes swallow exactly this kind and propagate every other one.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    pub(crate) fn invalid_date(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidDate {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}
