//! # Socket Integration Test Support
//!
//! Shared helpers for the socket dispatcher integration suites: pair
//! bootstrap functions, slice-backed read/write wrappers, and an external
//! signal waiter that demonstrates the intended waiting discipline (the
//! dispatcher itself never blocks; callers observe signals and retry).

use core_types::{CreateFlags, Signals, SocketError};
use parking_lot::{Condvar, Mutex};
use sockets::{EndpointHandle, PairConfig, SignalAuditLog, SignalObserver, SocketEndpoint, SocketPair};
use std::sync::Arc;
use std::time::{Duration, Instant};
use user_copy::{SliceSink, SliceSource};

/// Creates a stream pair with default configuration.
pub fn stream_pair() -> (EndpointHandle, EndpointHandle) {
    let (e0, e1, _) = SocketPair::create(CreateFlags::empty()).expect("pair creation failed");
    (e0, e1)
}

/// Creates a datagram pair with default configuration.
pub fn datagram_pair() -> (EndpointHandle, EndpointHandle) {
    let (e0, e1, _) =
        SocketPair::create(CreateFlags::DATAGRAM).expect("pair creation failed");
    (e0, e1)
}

/// Creates a pair with the given flags and default configuration.
pub fn pair_with(flags: CreateFlags) -> (EndpointHandle, EndpointHandle) {
    let (e0, e1, _) = SocketPair::create(flags).expect("pair creation failed");
    (e0, e1)
}

/// Creates a pair with an explicit configuration.
pub fn pair_with_config(flags: CreateFlags, config: PairConfig) -> (EndpointHandle, EndpointHandle) {
    let (e0, e1, _) =
        SocketPair::create_with_config(flags, config).expect("pair creation failed");
    (e0, e1)
}

/// Creates a small-capacity stream pair plus a shared audit log.
pub fn audited_stream_pair(
    capacity: usize,
) -> (EndpointHandle, EndpointHandle, Arc<SignalAuditLog>) {
    let audit = Arc::new(SignalAuditLog::new());
    let config = PairConfig::new()
        .with_capacity(capacity)
        .with_audit_log(audit.clone());
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);
    (e0, e1, audit)
}

/// Writes a whole slice, returning how much the endpoint accepted.
pub fn write_bytes(endpoint: &SocketEndpoint, data: &[u8]) -> Result<usize, SocketError> {
    endpoint.write(&SliceSource::new(data), data.len())
}

/// Reads up to `len` bytes into a fresh buffer.
pub fn read_bytes(endpoint: &SocketEndpoint, len: usize) -> Result<Vec<u8>, SocketError> {
    let mut buf = vec![0u8; len];
    let n = endpoint.read(Some(&mut SliceSink::new(&mut buf)), len)?;
    buf.truncate(n);
    Ok(buf)
}

/// Writes a whole slice as a control message.
pub fn write_control_bytes(endpoint: &SocketEndpoint, data: &[u8]) -> Result<(), SocketError> {
    endpoint.write_control(&SliceSource::new(data), data.len())
}

/// Reads a control message into a fresh buffer of size `len`.
pub fn read_control_bytes(endpoint: &SocketEndpoint, len: usize) -> Result<Vec<u8>, SocketError> {
    let mut buf = vec![0u8; len];
    let n = endpoint.read_control(&mut SliceSink::new(&mut buf), len)?;
    buf.truncate(n);
    Ok(buf)
}

/// Produces `len` bytes cycling through 0..=255.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// Condvar-based external waiter over the signal state machine.
///
/// Register one instance as the pair's observer, then block in
/// [`wait_for`](SignalWaiter::wait_for) until an endpoint raises any of the
/// watched bits. The generation counter is bumped under the waiter's own
/// mutex, so a transition between the signal check and the wait cannot be
/// missed.
pub struct SignalWaiter {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl SignalWaiter {
    /// Creates a waiter ready to be registered via
    /// [`PairConfig::with_observer`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            generation: Mutex::new(0),
            condvar: Condvar::new(),
        })
    }

    /// Blocks until `endpoint` asserts any bit of `mask`, or the timeout
    /// elapses. Returns whether the mask was observed.
    pub fn wait_for(&self, endpoint: &SocketEndpoint, mask: Signals, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        loop {
            if endpoint.signals().intersects(mask) {
                return true;
            }
            if self
                .condvar
                .wait_until(&mut generation, deadline)
                .timed_out()
            {
                return endpoint.signals().intersects(mask);
            }
        }
    }
}

impl SignalObserver for SignalWaiter {
    fn on_signals_changed(&self, _endpoint: core_types::EndpointId, _previous: Signals, _current: Signals) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.condvar.notify_all();
    }
}
