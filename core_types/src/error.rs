//! Dispatcher error types

use thiserror::Error;

/// Errors returned by the public socket operations
///
/// Propagation is strictly local: no operation retries internally, and a
/// partial stream write is reported as success with the accepted prefix
/// length, never as an error.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SocketError {
    /// Unknown flag bits, out-of-range transfer length, a failed user-memory
    /// copy, or user-signal bits outside the user range
    #[error("invalid arguments")]
    InvalidArgs,

    /// Allocation failure while creating a pair or its control buffers
    #[error("out of memory")]
    NoMemory,

    /// The operation requires the peer and the peer is gone
    #[error("peer closed")]
    PeerClosed,

    /// The endpoint is in a state that permanently forbids the operation
    #[error("bad state")]
    BadState,

    /// Transient flow control: the caller should watch the relevant signal
    /// and retry
    #[error("should wait")]
    ShouldWait,

    /// A control write exceeded the control-slot capacity
    #[error("out of range")]
    OutOfRange,

    /// Share or accept on an endpoint created without accept support
    #[error("not supported")]
    NotSupported,
}
