//! # Observer Protocol — Synchronous Broadcast
//!
//! The only channel through which the store and the validator talk to
//! presentation consumers. A [`Broadcaster`] owns a listener registry and
//! delivers payloads by shared reference.
//!
//! ## Delivery Guarantees
//!
//! - Synchronous: every listener has run before `dispatch` returns.
//! - Ordered: listeners run in registration order.
//! - Snapshotted: the listener set is copied at the start of each pass.
//!   Subscribing or unsubscribing from inside a listener takes effect on the
//!   next pass, never the current one.
//! - Isolated: a listener that returns `Err` or panics is logged and
//!   counted, and delivery continues with the next listener.
//!
//! The registry lock is never held while a listener runs, so listeners may
//! freely subscribe and unsubscribe.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// What a listener reports back. Errors are logged, never propagated.
pub type ListenerResult = anyhow::Result<()>;

type Listener<T> = Arc<dyn Fn(&T) -> ListenerResult + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// Type-erased removal so a [`Subscription`] need not carry the payload type.
trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

impl<T: 'static> Detach for Mutex<Registry<T>> {
    fn detach(&self, id: u64) -> bool {
        let mut registry = self.lock();
        let before = registry.listeners.len();
        registry.listeners.retain(|(lid, _)| *lid != id);
        registry.listeners.len() != before
    }
}

// ─── Dispatch report ─────────────────────────────────────────────────

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Listeners that completed successfully.
    pub delivered: usize,
    /// Listeners that returned an error or panicked.
    pub failed: usize,
}

// ─── Broadcaster ─────────────────────────────────────────────────────

/// A registry of listeners for payloads of type `T`.
///
/// Cloning a `Broadcaster` yields a second handle onto the same registry.
pub struct Broadcaster<T> {
    channel: &'static str,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("channel", &self.channel)
            .field("listener_count", &self.registry.lock().listeners.len())
            .finish()
    }
}

impl<T: 'static> Broadcaster<T> {
    /// Create an empty broadcaster. `channel` names it in log output.
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener for subsequent dispatches.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) -> ListenerResult + Send + Sync + 'static,
    {
        self.register(Arc::new(listener)).0
    }

    /// Register a listener and deliver `initial` to it alone, immediately.
    ///
    /// Used for "current value, then every change" subscriptions. A failure
    /// on the initial delivery is isolated like any other.
    pub fn subscribe_with_initial<F>(&self, listener: F, initial: &T) -> Subscription
    where
        F: Fn(&T) -> ListenerResult + Send + Sync + 'static,
    {
        let (subscription, listener) = self.register(Arc::new(listener));
        deliver(self.channel, subscription.id, &listener, initial);
        subscription
    }

    /// Deliver `payload` to every listener registered when the pass starts.
    pub fn dispatch(&self, payload: &T) -> DispatchReport {
        let snapshot: Vec<(u64, Listener<T>)> = self.registry.lock().listeners.clone();

        let mut report = DispatchReport::default();
        for (id, listener) in &snapshot {
            if deliver(self.channel, *id, listener, payload) {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        tracing::trace!(
            channel = self.channel,
            delivered = report.delivered,
            failed = report.failed,
            "dispatch complete"
        );
        report
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    fn register(&self, listener: Listener<T>) -> (Subscription, Listener<T>) {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::clone(&listener)));
            id
        };
        let weak: Weak<dyn Detach> = Arc::downgrade(&self.registry) as Weak<dyn Detach>;
        let subscription = Subscription {
            id,
            channel: self.channel,
            registry: weak,
        };
        (subscription, listener)
    }
}

fn deliver<T>(channel: &'static str, id: u64, listener: &Listener<T>, payload: &T) -> bool {
    match catch_unwind(AssertUnwindSafe(|| listener(payload))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(channel, listener = id, error = %format!("{e:#}"), "listener failed");
            false
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(channel, listener = id, panic = %message, "listener panicked");
            false
        }
    }
}

// ─── Subscription ────────────────────────────────────────────────────

/// Handle returned by `subscribe`. Dropping it does not unsubscribe.
pub struct Subscription {
    id: u64,
    channel: &'static str,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove the listener. Returns `false` if it was already removed or the
    /// broadcaster no longer exists.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.detach(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}
