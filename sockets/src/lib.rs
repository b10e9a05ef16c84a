//! # Sockets
//!
//! This crate implements the bidirectional paired-endpoint socket
//! dispatcher: a kernel-object style socket pair whose two endpoints share
//! an in-kernel byte pipeline with stream or datagram semantics, an
//! out-of-band control-message slot, an accept slot for handing off
//! endpoint handles, and an observable readiness-signal state machine.
//!
//! ## Philosophy
//!
//! - **Non-blocking mechanisms**: every operation makes progress, reports
//!   flow control (`ShouldWait`), or fails terminally. Waiting lives
//!   entirely outside the dispatcher, composed over the signal bitset.
//! - **One lock per endpoint**: no operation ever holds two endpoint locks.
//!   Cross-endpoint work captures a strong peer reference under the local
//!   lock, releases it, then takes the peer's lock.
//! - **Observable state**: signal transitions are atomic, serialized per
//!   endpoint, and can be recorded in a deterministic audit log for test
//!   verification.
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A POSIX socket layer (no addresses, no connect/listen)
//! - A transport (nothing crosses a machine boundary)
//! - A scheduler (no internal waiting, timeouts, or fairness)

pub mod audit;
pub mod endpoint;
pub mod handle;
pub mod pair;
pub mod pipeline;
pub mod signal_state;

pub use audit::{SignalAuditLog, SignalTransition};
pub use endpoint::{ShareError, SocketEndpoint};
pub use handle::EndpointHandle;
pub use pair::{PairConfig, SocketPair};
pub use pipeline::{DataPipeline, PipelineError};
pub use signal_state::{SignalObserver, SignalState};
