//! # presence-compliance — Rolling Attendance Compliance
//!
//! Decides whether a set of marked days satisfies a rolling in-office
//! policy, and wires that decision to the store and the holiday providers.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`validator`] | Pure sliding-window scan with early exit on the first violation |
//! | [`monitor`] | Owns the latest result; store changes invalidate it |
//! | [`sync`] | Settings changed → resolve holidays → mark them in the store |
//!
//! ## Data Flow
//!
//! ```text
//! HolidaySettings ──► HolidaySync ──► DateStateStore ──► ComplianceMonitor
//!                        │  (resolve, apply)   │ notify        │ run
//!                        ▼                     ▼               ▼
//!                   HolidayEvent         StoreNotification  ValidationEvent
//! ```
//!
//! Everything except holiday resolution is synchronous. The store is owned
//! by the caller and lent to these components by reference.

pub mod monitor;
pub mod sync;
pub mod validator;

pub use monitor::{ComplianceMonitor, ComplianceStatus, ValidationEvent};
pub use sync::{HolidayEvent, HolidaySettings, HolidaySync, Resolution};
pub use validator::{
    scan_windows, validate, ComplianceWindow, PolicyError, ValidationResult, WindowPolicy,
};
