//! # presence-core — Foundational Types for Attendance Compliance
//!
//! This crate is the leaf of the presence workspace. It defines the
//! primitives every other crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One canonical date key.** `CalendarDate` wraps `chrono::NaiveDate`.
//!    Strings and native dates normalize to the same value through
//!    [`AsCalendarDate`]; a string that cannot be parsed is an error, never a
//!    silently defaulted date.
//!
//! 2. **Priority is an ordinal, not a lookup.** `DateState::rank()` is an
//!    exhaustive `match`, so adding a state forces the ordering to be
//!    revisited.
//!
//! 3. **Observers see immutable payloads.** The [`Broadcaster`] delivers
//!    synchronously, in registration order, to a snapshot of the listener
//!    set taken at dispatch time. A failing listener is logged and skipped.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `presence-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod date;
pub mod error;
pub mod notify;
pub mod state;

// Re-export primary types for ergonomic imports.
pub use date::{default_visible_range, is_weekday, AsCalendarDate, CalendarDate, DateRange};
pub use error::PresenceError;
pub use notify::{Broadcaster, DispatchReport, ListenerResult, Subscription};
pub use state::{DateState, MarkingMode};
