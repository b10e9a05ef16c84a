//! Signal transition audit trail.
//!
//! An opt-in, deterministic record of every effective signal transition on
//! the endpoints that share the log. Tests attach one through
//! [`PairConfig::with_audit_log`](crate::pair::PairConfig::with_audit_log)
//! and assert on the trail instead of polling.

use core_types::{EndpointId, Signals};
use parking_lot::Mutex;

/// A single recorded signal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTransition {
    /// The endpoint whose signal word changed
    pub endpoint: EndpointId,
    /// The word before the transition
    pub previous: Signals,
    /// The word after the transition
    pub current: Signals,
}

impl SignalTransition {
    /// Returns the bits this transition raised.
    pub fn raised(&self) -> Signals {
        self.current.difference(self.previous)
    }

    /// Returns the bits this transition cleared.
    pub fn cleared(&self) -> Signals {
        self.previous.difference(self.current)
    }
}

/// Chronological log of signal transitions.
#[derive(Debug, Default)]
pub struct SignalAuditLog {
    entries: Mutex<Vec<SignalTransition>>,
}

impl SignalAuditLog {
    /// Creates a new empty audit log.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn record_transition(&self, transition: SignalTransition) {
        self.entries.lock().push(transition);
    }

    /// Returns a copy of all recorded transitions.
    pub fn events(&self) -> Vec<SignalTransition> {
        self.entries.lock().clone()
    }

    /// Returns the transitions recorded for one endpoint.
    pub fn events_for(&self, endpoint: EndpointId) -> Vec<SignalTransition> {
        self.entries
            .lock()
            .iter()
            .filter(|t| t.endpoint == endpoint)
            .copied()
            .collect()
    }

    /// Counts transitions matching the predicate.
    pub fn count_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&SignalTransition) -> bool,
    {
        self.entries.lock().iter().filter(|t| predicate(t)).count()
    }

    /// Checks whether any transition matches the predicate.
    pub fn has_transition<F>(&self, predicate: F) -> bool
    where
        F: Fn(&SignalTransition) -> bool,
    {
        self.entries.lock().iter().any(|t| predicate(t))
    }

    /// Clears all recorded transitions.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of recorded transitions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Checks whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
