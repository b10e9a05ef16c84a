//! Buffer limits and transfer bounds

/// Default capacity of each endpoint's inbound pipeline, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256 * 1024;

/// Capacity of the out-of-band control-message slot, in bytes.
pub const CONTROL_MSG_MAX: usize = 1024;

/// Internal accounting overhead per queued datagram frame.
///
/// Each frame carries a 32-bit length prefix, so the largest frame a
/// pipeline of capacity `c` can hold is `c - DATAGRAM_HEADER_BYTES`.
pub const DATAGRAM_HEADER_BYTES: usize = 4;

/// Largest length a single transfer may request.
///
/// The wire contract encodes transfer lengths in 32 bits; anything larger
/// is rejected with `InvalidArgs` before touching the pipeline.
pub const MAX_TRANSFER_LEN: usize = u32::MAX as usize;
