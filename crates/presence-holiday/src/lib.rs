//! # presence-holiday — Holiday Exclusion Providers
//!
//! Resolves the set of public (and optionally company) holidays for a
//! country and a set of years. The compliance engine consumes these dates
//! as exclusions: a holiday weekday counts toward neither side of a window's
//! in-office ratio.
//!
//! ## Providers
//!
//! | Provider | Source | Company holidays |
//! |----------|--------|------------------|
//! | [`RuleBasedProvider`] | built-in rule tables (US, GB, DE, CA) | yes, registered per company |
//! | [`NagerHolidayProvider`] | `date.nager.at` public-holiday API | ignored |
//! | [`CachedProvider`] | wraps any provider | inherited |
//!
//! Idempotence within a session is the provider's job, not the engine's:
//! wrap network providers in [`CachedProvider`].

pub mod cache;
pub mod error;
pub mod nager;
pub mod provider;
pub(crate) mod retry;
pub mod rules;

pub use cache::CachedProvider;
pub use error::{ConfigError, HolidayError};
pub use nager::{NagerConfig, NagerHolidayProvider};
pub use provider::{HolidayProvider, HolidaySet};
pub use rules::{HolidayRule, Observance, RuleBasedProvider};
