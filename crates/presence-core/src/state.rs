//! # Work-Location States and Marking Modes
//!
//! `DateState` is the value stored per calendar day. Conflicting writes are
//! resolved by priority: `Holiday > Oof > Working`. A holiday is the
//! stickiest mark and is never downgraded by an unforced write.
//!
//! `MarkingMode` is what the calendar is currently painting with. It cycles
//! `Working → Oof → Holiday → Working`.

use serde::{Deserialize, Serialize};

use crate::error::PresenceError;

// ─── DateState ───────────────────────────────────────────────────────

/// The work-location state of a single calendar day.
///
/// An unmarked day has no `DateState` at all; there is no sentinel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateState {
    /// In the office. The only state that counts toward compliance.
    Working,
    /// Out of office.
    Oof,
    /// Public or company holiday.
    Holiday,
}

impl DateState {
    /// All states, lowest priority first.
    pub const ALL: [DateState; 3] = [DateState::Working, DateState::Oof, DateState::Holiday];

    /// Conflict-resolution priority. Higher wins an unforced write.
    pub fn rank(self) -> u8 {
        match self {
            Self::Working => 0,
            Self::Oof => 1,
            Self::Holiday => 2,
        }
    }

    /// Whether an unforced write of `requested` may replace `self`.
    ///
    /// Equal priority is allowed through; only a strictly higher existing
    /// priority blocks the write.
    pub fn yields_to(self, requested: DateState) -> bool {
        self.rank() <= requested.rank()
    }

    /// Whether this state counts as an in-office day.
    pub fn is_in_office(self) -> bool {
        matches!(self, Self::Working)
    }

    /// Semantic tag for the presentation layer's visual vocabulary.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Oof => "oof",
            Self::Holiday => "holiday",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Working => "In office",
            Self::Oof => "Out of office",
            Self::Holiday => "Holiday",
        }
    }
}

impl std::fmt::Display for DateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for DateState {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(Self::Working),
            "oof" => Ok(Self::Oof),
            "holiday" => Ok(Self::Holiday),
            _ => Err(PresenceError::InvalidState(s.to_string())),
        }
    }
}

// ─── MarkingMode ─────────────────────────────────────────────────────

/// The state the calendar paints with when a day is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkingMode {
    /// Paint in-office days.
    #[default]
    Working,
    /// Paint out-of-office days.
    Oof,
    /// Paint holidays.
    Holiday,
}

impl MarkingMode {
    /// The next mode in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Working => Self::Oof,
            Self::Oof => Self::Holiday,
            Self::Holiday => Self::Working,
        }
    }

    /// The state this mode writes.
    pub fn state(self) -> DateState {
        match self {
            Self::Working => DateState::Working,
            Self::Oof => DateState::Oof,
            Self::Holiday => DateState::Holiday,
        }
    }
}

impl From<DateState> for MarkingMode {
    fn from(state: DateState) -> Self {
        match state {
            DateState::Working => Self::Working,
            DateState::Oof => Self::Oof,
            DateState::Holiday => Self::Holiday,
        }
    }
}

impl std::fmt::Display for MarkingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.state().tag())
    }
}

impl std::str::FromStr for MarkingMode {
    type Err = PresenceError;

    /// Parse a mode name coming from outside the type system.
    ///
    /// # Errors
    ///
    /// [`PresenceError::InvalidMode`] for anything outside the cycle.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<DateState>()
            .map(Self::from)
            .map_err(|_| PresenceError::InvalidMode(s.to_string()))
    }
}
