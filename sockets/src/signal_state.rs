//! Readiness-signal state machine.
//!
//! Each endpoint owns one `SignalState`: an atomic signal word whose
//! transitions are applied while the owning endpoint's lock is held, so a
//! given bit always has a single writer per transition. External waiters
//! snapshot the word without taking any lock.

use crate::audit::{SignalAuditLog, SignalTransition};
use core_types::{EndpointId, Signals};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Notification hook for signal transitions.
///
/// Invoked after every effective transition, while the lock of the endpoint
/// that owns the transition is held. Implementations must return promptly
/// and must not call back into socket operations.
pub trait SignalObserver: Send + Sync {
    /// Reports that `endpoint` moved from `previous` to `current`.
    fn on_signals_changed(&self, endpoint: EndpointId, previous: Signals, current: Signals);
}

/// The observable signal word of one endpoint.
pub struct SignalState {
    endpoint: EndpointId,
    bits: AtomicU32,
    observer: Option<Arc<dyn SignalObserver>>,
    audit: Option<Arc<SignalAuditLog>>,
}

impl SignalState {
    pub(crate) fn new(
        endpoint: EndpointId,
        initial: Signals,
        observer: Option<Arc<dyn SignalObserver>>,
        audit: Option<Arc<SignalAuditLog>>,
    ) -> Self {
        Self {
            endpoint,
            bits: AtomicU32::new(initial.bits()),
            observer,
            audit,
        }
    }

    /// Returns a snapshot of the current signal word.
    pub fn current(&self) -> Signals {
        Signals::from_bits_truncate(self.bits.load(Ordering::Acquire))
    }

    /// Clears `clear` then sets `set` in one atomic transition.
    pub(crate) fn update(&self, clear: Signals, set: Signals) {
        self.apply(|bits| Some((bits & !clear.bits()) | set.bits()));
    }

    /// Sets `set` unless any bit of `unless` is currently present.
    ///
    /// Used to re-raise `WRITABLE` after a drain without resurrecting a
    /// write side that was shut down in the meantime.
    pub(crate) fn raise_unless(&self, set: Signals, unless: Signals) {
        self.apply(|bits| {
            if bits & unless.bits() != 0 {
                None
            } else {
                Some(bits | set.bits())
            }
        });
    }

    fn apply<F>(&self, transition: F)
    where
        F: Fn(u32) -> Option<u32>,
    {
        if let Ok(previous) = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| transition(bits))
        {
            let current = transition(previous).unwrap_or(previous);
            if current != previous {
                self.notify(
                    Signals::from_bits_truncate(previous),
                    Signals::from_bits_truncate(current),
                );
            }
        }
    }

    fn notify(&self, previous: Signals, current: Signals) {
        if let Some(audit) = &self.audit {
            audit.record_transition(SignalTransition {
                endpoint: self.endpoint,
                previous,
                current,
            });
        }
        if let Some(observer) = &self.observer {
            observer.on_signals_changed(self.endpoint, previous, current);
        }
    }
}

impl fmt::Debug for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalState")
            .field("endpoint", &self.endpoint)
            .field("current", &self.current())
            .finish()
    }
}
