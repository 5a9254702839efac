//! # presence-cli — Command-Line Front End
//!
//! Provides the `presence` binary.
//!
//! ## Subcommands
//!
//! - `presence validate` — load settings and marks, apply holidays, report
//!   the first non-compliant window. Exit code 0 compliant, 1 not, 2 error.
//! - `presence windows` — the same inputs, every window listed.
//! - `presence holidays` — print the resolved holiday dates for a country.
//!
//! ```bash
//! presence validate --config presence.yaml --marks marks.yaml
//! presence windows --marks marks.yaml --start 2026-02-01 --end 2026-04-30
//! presence holidays --country US --year 2026
//! ```

pub mod holidays;
pub mod provider;
pub mod session;
pub mod settings;
pub mod validate;
