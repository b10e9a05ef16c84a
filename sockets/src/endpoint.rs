//! The socket endpoint object.
//!
//! An endpoint is one side of a pair. It owns the inbound pipeline its peer
//! writes into, the optional control slot, the optional accept slot, and
//! its signal word. A single mutex guards the mutable state; operations
//! that must touch both endpoints capture a strong peer reference under
//! the local lock, release it, and only then take the peer's lock, so no
//! thread ever holds two endpoint locks at once.

use crate::audit::SignalAuditLog;
use crate::handle::EndpointHandle;
use crate::pipeline::{DataPipeline, PipelineError};
use crate::signal_state::{SignalObserver, SignalState};
use core_types::{
    CreateFlags, EndpointId, PairId, ShutdownFlags, Signals, SocketError, MAX_TRANSFER_LEN,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use user_copy::{UserSink, UserSource};

impl From<PipelineError> for SocketError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Full => SocketError::ShouldWait,
            PipelineError::CopyFailed => SocketError::InvalidArgs,
        }
    }
}

/// A failed share, carrying the handle back to the caller.
///
/// Sharing consumes the handle on success; on failure the handle is
/// returned here so the caller keeps ownership instead of the slot (or the
/// drop path) taking it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ShareError {
    /// Why the share failed
    pub error: SocketError,
    /// The handle the caller tried to share
    pub handle: EndpointHandle,
}

/// Single-occupancy out-of-band message slot.
///
/// The backing buffer is allocated once at pair creation and reused; a
/// zero length means the slot is free.
struct ControlSlot {
    buf: Box<[u8]>,
    len: usize,
}

impl ControlSlot {
    fn allocate(capacity: usize) -> Result<Self, SocketError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| SocketError::NoMemory)?;
        buf.resize(capacity, 0);
        Ok(Self {
            buf: buf.into_boxed_slice(),
            len: 0,
        })
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn fill(&mut self, src: &dyn UserSource, len: usize) -> Result<(), SocketError> {
        src.copy_from_user(0, &mut self.buf[..len])
            .map_err(|_| SocketError::InvalidArgs)?;
        self.len = len;
        Ok(())
    }

    /// Copies out at most `len` bytes and frees the slot entirely; any
    /// excess beyond the caller's buffer is discarded.
    fn drain(&mut self, dst: &mut dyn UserSink, len: usize) -> Result<usize, SocketError> {
        let n = self.len.min(len);
        dst.copy_to_user(0, &self.buf[..n])
            .map_err(|_| SocketError::InvalidArgs)?;
        self.len = 0;
        Ok(n)
    }
}

impl fmt::Debug for ControlSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSlot")
            .field("capacity", &self.buf.len())
            .field("len", &self.len)
            .finish()
    }
}

/// Lock-protected mutable state of an endpoint.
#[derive(Debug)]
struct EndpointInner {
    /// Strong reference to the paired endpoint, cleared exactly once when
    /// the peer's last external handle goes away
    peer: Option<Arc<SocketEndpoint>>,
    pipeline: DataPipeline,
    control: Option<ControlSlot>,
    accept_slot: Option<EndpointHandle>,
    /// Latched when this side (or the peer's write side) renounces reads;
    /// the READ_DISABLED signal is raised only once the pipeline drains
    read_disabled: bool,
}

/// One side of a socket pair.
pub struct SocketEndpoint {
    id: EndpointId,
    peer_id: EndpointId,
    pair: PairId,
    flags: CreateFlags,
    control_capacity: usize,
    signals: SignalState,
    inner: Mutex<EndpointInner>,
    handle_count: AtomicUsize,
}

impl SocketEndpoint {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: EndpointId,
        peer_id: EndpointId,
        pair: PairId,
        flags: CreateFlags,
        initial_signals: Signals,
        pipeline: DataPipeline,
        control_capacity: usize,
        observer: Option<Arc<dyn SignalObserver>>,
        audit: Option<Arc<SignalAuditLog>>,
    ) -> Result<Arc<Self>, SocketError> {
        let control = if flags.contains(CreateFlags::HAS_CONTROL) {
            Some(ControlSlot::allocate(control_capacity)?)
        } else {
            None
        };
        Ok(Arc::new(Self {
            id,
            peer_id,
            pair,
            flags,
            control_capacity,
            signals: SignalState::new(id, initial_signals, observer, audit),
            inner: Mutex::new(EndpointInner {
                peer: None,
                pipeline,
                control,
                accept_slot: None,
                read_disabled: false,
            }),
            handle_count: AtomicUsize::new(0),
        }))
    }

    /// Links the peer reference. Called by the pair factory while both
    /// endpoints are still private to it.
    pub(crate) fn link_peer(&self, peer: Arc<SocketEndpoint>) {
        self.inner.lock().peer = Some(peer);
    }

    /// Returns this endpoint's id.
    pub fn id(&self) -> EndpointId {
        self.id
    }

    /// Returns the id the peer was created with.
    ///
    /// Recorded at construction and retained after the peer is gone, so it
    /// is always safe to use for diagnostics.
    pub fn peer_id(&self) -> EndpointId {
        self.peer_id
    }

    /// Returns the id of the pair both endpoints belong to.
    pub fn pair_id(&self) -> PairId {
        self.pair
    }

    /// Returns the creation flags (identical on both endpoints).
    pub fn flags(&self) -> CreateFlags {
        self.flags
    }

    /// Returns a lock-free snapshot of the signal word.
    pub fn signals(&self) -> Signals {
        self.signals.current()
    }

    /// Returns the number of buffered payload bytes.
    pub fn outstanding_read_bytes(&self) -> usize {
        self.inner.lock().pipeline.size()
    }

    fn capture_peer(&self) -> Option<Arc<SocketEndpoint>> {
        self.inner.lock().peer.clone()
    }

    /// Writes up to `len` bytes from `src` into the peer's inbound
    /// pipeline, returning how many were accepted.
    ///
    /// Stream endpoints may accept a strict prefix; datagram endpoints
    /// accept the whole frame or report `ShouldWait`. A zero-length write
    /// is a successful no-op that touches no signals.
    pub fn write(&self, src: &dyn UserSource, len: usize) -> Result<usize, SocketError> {
        let peer = {
            let inner = self.inner.lock();
            let peer = inner.peer.clone().ok_or(SocketError::PeerClosed)?;
            if self.signals.current().contains(Signals::WRITE_DISABLED) {
                return Err(SocketError::BadState);
            }
            peer
        };

        if len == 0 {
            return Ok(0);
        }
        if len > MAX_TRANSFER_LEN {
            return Err(SocketError::InvalidArgs);
        }

        peer.write_self(src, len)
    }

    /// Second stage of a write, running on the receiving endpoint.
    pub(crate) fn write_self(&self, src: &dyn UserSource, len: usize) -> Result<usize, SocketError> {
        let mut inner = self.inner.lock();

        if inner.pipeline.is_full() {
            return Err(SocketError::ShouldWait);
        }
        let was_empty = inner.pipeline.is_empty();

        let written = inner.pipeline.write(src, len)?;

        if written > 0 && was_empty {
            self.signals.update(Signals::empty(), Signals::READABLE);
        }
        if inner.pipeline.is_full() {
            if let Some(peer) = &inner.peer {
                peer.signals.update(Signals::WRITABLE, Signals::empty());
            }
        }

        Ok(written)
    }

    /// Reads up to `len` bytes into `dst`.
    ///
    /// With `dst` absent and `len == 0` this is a non-destructive query
    /// returning the number of buffered bytes, even when the peer is gone.
    /// Stream reads return a prefix of the queued bytes; datagram reads
    /// consume exactly one frame, truncated to `len`.
    pub fn read(&self, dst: Option<&mut dyn UserSink>, len: usize) -> Result<usize, SocketError> {
        let mut inner = self.inner.lock();

        let dst = match dst {
            Some(dst) => dst,
            None if len == 0 => return Ok(inner.pipeline.size()),
            None => return Err(SocketError::InvalidArgs),
        };

        if len > MAX_TRANSFER_LEN {
            return Err(SocketError::InvalidArgs);
        }

        if inner.pipeline.is_empty() {
            if inner.peer.is_none() {
                return Err(SocketError::PeerClosed);
            }
            // Reading is disabled and nothing is buffered: no readable
            // event can ever arrive, so report a terminal state rather
            // than flow control.
            if inner.read_disabled {
                return Err(SocketError::BadState);
            }
            return Err(SocketError::ShouldWait);
        }

        let was_full = inner.pipeline.is_full();

        let read = inner.pipeline.read(dst, len)?;

        if inner.pipeline.is_empty() {
            let set = if inner.read_disabled {
                Signals::READ_DISABLED
            } else {
                Signals::empty()
            };
            self.signals.update(Signals::READABLE, set);
        }
        if was_full && read > 0 {
            if let Some(peer) = &inner.peer {
                peer.signals
                    .raise_unless(Signals::WRITABLE, Signals::WRITE_DISABLED);
            }
        }

        Ok(read)
    }

    /// Disables the read and/or write direction of this endpoint and
    /// propagates the complementary disablement to the peer.
    ///
    /// Requesting a state that already holds is a silent success.
    pub fn shutdown(&self, how: ShutdownFlags) -> Result<(), SocketError> {
        let shutdown_read = how.contains(ShutdownFlags::READ);
        let shutdown_write = how.contains(ShutdownFlags::WRITE);

        let peer = {
            let mut inner = self.inner.lock();

            let mut want = Signals::empty();
            if shutdown_read {
                want |= Signals::READ_DISABLED;
            }
            if shutdown_write {
                want |= Signals::WRITE_DISABLED;
            }
            let have = self.signals.current()
                & (Signals::READ_DISABLED | Signals::WRITE_DISABLED);
            if want == have {
                return Ok(());
            }

            let mut clear = Signals::empty();
            let mut set = Signals::empty();
            if shutdown_read {
                inner.read_disabled = true;
                if inner.pipeline.is_empty() {
                    set |= Signals::READ_DISABLED;
                }
            }
            if shutdown_write {
                clear |= Signals::WRITABLE;
                set |= Signals::WRITE_DISABLED;
            }
            self.signals.update(clear, set);
            inner.peer.clone()
        };

        // The peer may already be gone; our own bits are updated either
        // way, so there is nothing left to do in that case.
        match peer {
            Some(peer) => {
                peer.shutdown_other(how);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Applies the peer-side consequences of a shutdown on the other end.
    pub(crate) fn shutdown_other(&self, how: ShutdownFlags) {
        let mut inner = self.inner.lock();
        let mut clear = Signals::empty();
        let mut set = Signals::empty();
        if how.contains(ShutdownFlags::READ) {
            // The other end stopped reading, so our writes can never land.
            clear |= Signals::WRITABLE;
            set |= Signals::WRITE_DISABLED;
        }
        if how.contains(ShutdownFlags::WRITE) {
            // Nothing new will arrive. Anything already buffered stays
            // readable; the READ_DISABLED signal is raised now only if the
            // pipeline is already dry, otherwise the draining read raises it.
            inner.read_disabled = true;
            if inner.pipeline.is_empty() {
                set |= Signals::READ_DISABLED;
            }
        }
        self.signals.update(clear, set);
    }

    /// Sends an out-of-band control message to the peer's control slot.
    pub fn write_control(&self, src: &dyn UserSource, len: usize) -> Result<(), SocketError> {
        if !self.flags.contains(CreateFlags::HAS_CONTROL) {
            return Err(SocketError::BadState);
        }
        if len == 0 {
            return Err(SocketError::InvalidArgs);
        }
        if len > self.control_capacity {
            return Err(SocketError::OutOfRange);
        }

        let peer = self.capture_peer().ok_or(SocketError::PeerClosed)?;
        peer.write_control_self(src, len)
    }

    /// Second stage of a control write, running on the receiving endpoint.
    pub(crate) fn write_control_self(
        &self,
        src: &dyn UserSource,
        len: usize,
    ) -> Result<(), SocketError> {
        let mut inner = self.inner.lock();

        let slot = inner.control.as_mut().ok_or(SocketError::BadState)?;
        if !slot.is_empty() {
            return Err(SocketError::ShouldWait);
        }
        slot.fill(src, len)?;

        self.signals
            .update(Signals::empty(), Signals::CONTROL_READABLE);
        if let Some(peer) = &inner.peer {
            peer.signals
                .update(Signals::CONTROL_WRITABLE, Signals::empty());
        }
        Ok(())
    }

    /// Receives the pending control message, if any.
    ///
    /// At most `len` bytes are copied out, and the slot is freed entirely
    /// regardless of how much the caller asked for.
    pub fn read_control(&self, dst: &mut dyn UserSink, len: usize) -> Result<usize, SocketError> {
        if !self.flags.contains(CreateFlags::HAS_CONTROL) {
            return Err(SocketError::BadState);
        }

        let mut inner = self.inner.lock();

        let slot = inner.control.as_mut().ok_or(SocketError::BadState)?;
        if slot.is_empty() {
            return Err(SocketError::ShouldWait);
        }
        let copied = slot.drain(dst, len)?;

        self.signals
            .update(Signals::CONTROL_READABLE, Signals::empty());
        if let Some(peer) = &inner.peer {
            peer.signals
                .update(Signals::empty(), Signals::CONTROL_WRITABLE);
        }
        Ok(copied)
    }

    /// Verifies that `target` may travel through this endpoint's pair.
    ///
    /// Endpoints that can themselves share are never transferable, and
    /// neither end of the carrying pair may be sent through it. Both rules
    /// exist to keep the socket graph acyclic.
    pub fn check_shareable(&self, target: &SocketEndpoint) -> Result<(), SocketError> {
        let inner = self.inner.lock();
        if target.flags.contains(CreateFlags::HAS_ACCEPT)
            || target.id == self.id
            || inner.peer.as_ref().map(|p| p.id) == Some(target.id)
        {
            return Err(SocketError::BadState);
        }
        Ok(())
    }

    /// Donates `handle` to the peer's accept slot.
    ///
    /// On failure the handle is handed back inside the error, so a refused
    /// share never costs the caller its handle.
    pub fn share(&self, handle: EndpointHandle) -> Result<(), ShareError> {
        if !self.flags.contains(CreateFlags::HAS_ACCEPT) {
            return Err(ShareError {
                error: SocketError::NotSupported,
                handle,
            });
        }
        if let Err(error) = self.check_shareable(handle.endpoint()) {
            return Err(ShareError { error, handle });
        }
        let peer = match self.capture_peer() {
            Some(peer) => peer,
            None => {
                return Err(ShareError {
                    error: SocketError::PeerClosed,
                    handle,
                })
            }
        };
        peer.share_self(handle)
    }

    /// Second stage of a share, running on the receiving endpoint.
    pub(crate) fn share_self(&self, handle: EndpointHandle) -> Result<(), ShareError> {
        let peer = {
            let mut inner = self.inner.lock();
            if inner.accept_slot.is_some() {
                return Err(ShareError {
                    error: SocketError::ShouldWait,
                    handle,
                });
            }
            inner.accept_slot = Some(handle);
            self.signals.update(Signals::empty(), Signals::ACCEPT);
            inner.peer.clone()
        };
        if let Some(peer) = peer {
            peer.signals.update(Signals::SHARE, Signals::empty());
        }
        Ok(())
    }

    /// Takes the handle waiting in this endpoint's accept slot.
    pub fn accept(&self) -> Result<EndpointHandle, SocketError> {
        if !self.flags.contains(CreateFlags::HAS_ACCEPT) {
            return Err(SocketError::NotSupported);
        }

        let mut inner = self.inner.lock();

        let handle = inner.accept_slot.take().ok_or(SocketError::ShouldWait)?;

        self.signals.update(Signals::ACCEPT, Signals::empty());
        if let Some(peer) = &inner.peer {
            peer.signals.update(Signals::empty(), Signals::SHARE);
        }
        Ok(handle)
    }

    /// Mutates user-defined signal bits on this endpoint or its peer.
    ///
    /// Bits outside the user range are rejected.
    pub fn user_signal(
        &self,
        clear: Signals,
        set: Signals,
        peer: bool,
    ) -> Result<(), SocketError> {
        if !(clear | set).is_user_only() {
            return Err(SocketError::InvalidArgs);
        }

        if !peer {
            let _inner = self.inner.lock();
            self.signals.update(clear, set);
            return Ok(());
        }

        let peer_ref = self.capture_peer().ok_or(SocketError::PeerClosed)?;
        let _inner = peer_ref.inner.lock();
        peer_ref.signals.update(clear, set);
        Ok(())
    }

    pub(crate) fn note_handle_created(&self) {
        self.handle_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns true when the dropped handle was the last one.
    pub(crate) fn note_handle_dropped(&self) -> bool {
        self.handle_count.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Returns the number of live external handles (diagnostics).
    pub fn handle_count(&self) -> usize {
        self.handle_count.load(Ordering::Acquire)
    }

    /// Fired when the last external handle to this endpoint is released.
    ///
    /// Severs the strong peer link from this side and tells the peer,
    /// which latches `PEER_CLOSED`.
    pub(crate) fn on_zero_handles(&self) {
        let peer = { self.inner.lock().peer.take() };
        if let Some(peer) = peer {
            peer.on_peer_zero_handles();
        }
    }

    /// Applied on the surviving endpoint when the other side's handles are
    /// all gone.
    pub(crate) fn on_peer_zero_handles(&self) {
        let dropped = {
            let mut inner = self.inner.lock();
            let dropped = inner.peer.take();
            self.signals
                .update(Signals::WRITABLE, Signals::PEER_CLOSED);
            dropped
        };
        // The taken reference may be the last one keeping the peer alive;
        // its teardown can cascade into other endpoints' handle counts, so
        // it must not happen under our lock.
        drop(dropped);
    }
}

impl fmt::Debug for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketEndpoint")
            .field("id", &self.id)
            .field("peer_id", &self.peer_id)
            .field("pair", &self.pair)
            .field("flags", &self.flags)
            .field("signals", &self.signals.current())
            .finish()
    }
}
