//! # Core Types
//!
//! This crate defines the fundamental vocabulary shared by every part of the
//! socket dispatcher: identifiers, flag and signal bitsets, buffer limits,
//! and the public error type.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: every bit on the wire surface has a name.
//! - **Type safety first**: creation flags, shutdown flags, signals, and
//!   rights are distinct types and cannot be confused.
//! - **Stable surface**: the numeric values of flags and signals are part of
//!   the external contract and are pinned by golden tests.
//!
//! ## Key Types
//!
//! - [`EndpointId`], [`PairId`]: unique identifiers for endpoints and pairs
//! - [`CreateFlags`]: creation-time behavior selection
//! - [`Signals`]: the observable readiness bitset
//! - [`ShutdownFlags`], [`Rights`]: half-close selection and handle rights
//! - [`SocketError`]: every error a public operation can return

pub mod error;
pub mod flags;
pub mod ids;
pub mod limits;

pub use error::SocketError;
pub use flags::{CreateFlags, Rights, ShutdownFlags, Signals};
pub use ids::{EndpointId, PairId};
pub use limits::{CONTROL_MSG_MAX, DEFAULT_BUFFER_CAPACITY, DATAGRAM_HEADER_BYTES, MAX_TRANSFER_LEN};
