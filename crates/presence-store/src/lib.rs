//! # presence-store — Date-State Store
//!
//! Owns the mapping from calendar day to work-location state, the active
//! marking mode, and the configured visible range. Every successful change
//! is announced to subscribers as an immutable [`StoreSnapshot`].
//!
//! ## Write Rules
//!
//! - Dates are normalized first. Unparsable input is `InvalidDate`.
//! - Writes outside the configured range are `OutOfRange`.
//! - An unforced write that would lower a day's priority
//!   (`holiday > oof > working`) is dropped without error, mutation or
//!   notification. A forced write always lands.
//! - Batch marking is forced, skips out-of-range days, and notifies once.
//!
//! The store is constructed and owned explicitly. Components that need it
//! receive a reference; consumers only ever see snapshots.

pub mod store;

pub use store::{
    BatchOutcome, DateStateStore, StateMap, Statistics, StoreChange, StoreNotification,
    StoreSnapshot,
};
