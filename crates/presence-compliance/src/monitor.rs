//! # Compliance Monitor — Result Ownership and Invalidation
//!
//! Owns the latest [`ValidationResult`] and keeps it honest: any store
//! change that touches the state map or range clears it and announces
//! [`ValidationEvent::Invalidated`]. A consumer that only ever reads
//! [`ComplianceMonitor::latest`] can never show a result computed against
//! a state map that has since changed.
//!
//! Validation is not re-run automatically. Callers decide when to run, for
//! example after holidays have been applied.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use presence_core::{Broadcaster, ListenerResult, Subscription};
use presence_holiday::HolidaySet;
use presence_store::{DateStateStore, StoreSnapshot};

use crate::validator::{validate, ValidationResult, WindowPolicy};

/// A validation result tagged with the store revision it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceStatus {
    /// Store revision the result was computed against.
    pub revision: u64,
    /// The policy in force for the run.
    pub policy: WindowPolicy,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Signals emitted by the monitor.
#[derive(Debug, Clone)]
pub enum ValidationEvent {
    /// The previous result no longer describes the store.
    Invalidated {
        /// Store revision that made it stale.
        revision: u64,
    },
    /// A run finished; this is now the latest result.
    Completed(Arc<ComplianceStatus>),
}

#[derive(Debug)]
struct Shared {
    policy: WindowPolicy,
    latest: Option<Arc<ComplianceStatus>>,
}

/// Owner of the current validation result.
pub struct ComplianceMonitor {
    shared: Arc<Mutex<Shared>>,
    events: Broadcaster<ValidationEvent>,
}

impl ComplianceMonitor {
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared { policy, latest: None })),
            events: Broadcaster::new("validation"),
        }
    }

    /// Watch `store` and invalidate on every state-map or range change.
    ///
    /// The returned subscription belongs to the store; unsubscribe it to
    /// detach.
    pub fn attach(&self, store: &DateStateStore) -> Subscription {
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        store.subscribe(move |notification| {
            if !notification.change.invalidates_derived_state() {
                return Ok(());
            }
            let revision = notification.snapshot.revision;
            let cleared = {
                let mut shared = shared.lock();
                let stale = shared.latest.as_ref().is_some_and(|s| s.revision != revision);
                if stale {
                    shared.latest = None;
                }
                stale
            };
            if cleared {
                tracing::debug!(revision, change = ?notification.change, "validation result invalidated");
            }
            events.dispatch(&ValidationEvent::Invalidated { revision });
            Ok(())
        })
    }

    /// Validate the store's current state and publish the result.
    pub fn run(&self, store: &DateStateStore, exclusions: &HolidaySet) -> Arc<ComplianceStatus> {
        self.run_snapshot(&store.snapshot(), exclusions)
    }

    /// Validate a snapshot and publish the result.
    pub fn run_snapshot(&self, snapshot: &StoreSnapshot, exclusions: &HolidaySet) -> Arc<ComplianceStatus> {
        let policy = self.policy();
        let result = validate(&snapshot.states, &snapshot.range, exclusions, &policy);
        let status = Arc::new(ComplianceStatus {
            revision: snapshot.revision,
            policy,
            result,
        });

        tracing::info!(
            revision = status.revision,
            valid = status.result.is_valid,
            windows = status.result.windows_evaluated,
            "validation complete"
        );
        self.shared.lock().latest = Some(Arc::clone(&status));
        self.events.dispatch(&ValidationEvent::Completed(Arc::clone(&status)));
        status
    }

    /// The latest result, or `None` if it has been invalidated or never run.
    pub fn latest(&self) -> Option<Arc<ComplianceStatus>> {
        self.shared.lock().latest.clone()
    }

    pub fn policy(&self) -> WindowPolicy {
        self.shared.lock().policy
    }

    /// Replace the policy. The current result is discarded.
    pub fn set_policy(&self, policy: WindowPolicy) {
        let revision = {
            let mut shared = self.shared.lock();
            shared.policy = policy;
            shared.latest.take().map(|status| status.revision)
        };
        if let Some(revision) = revision {
            self.events.dispatch(&ValidationEvent::Invalidated { revision });
        }
    }

    /// Listen for [`ValidationEvent`]s.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ValidationEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }
}

impl std::fmt::Debug for ComplianceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("ComplianceMonitor")
            .field("policy", &shared.policy)
            .field("latest_revision", &shared.latest.as_ref().map(|s| s.revision))
            .field("listeners", &self.events.listener_count())
            .finish()
    }
}
