//! Flag, signal, and rights bitsets
//!
//! The numeric values here are the external contract: embedders that speak
//! the raw wire surface (`create_raw`, signal masks in wait results) depend
//! on them. Golden tests in `tests_sockets` pin every value.

use crate::error::SocketError;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Creation-time behavior of a socket pair.
    ///
    /// Both endpoints of a pair always carry identical flags. Absence of
    /// `DATAGRAM` means stream semantics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CreateFlags: u32 {
        /// Discrete-frame semantics instead of a byte stream
        const DATAGRAM = 1 << 0;
        /// Pre-allocate the out-of-band control-message slot on both sides
        const HAS_CONTROL = 1 << 1;
        /// Enable the accept-slot handle hand-off on both sides
        const HAS_ACCEPT = 1 << 2;
    }
}

impl CreateFlags {
    /// Validates a raw flag word from the wire surface.
    ///
    /// Any bit outside the recognized mask is rejected.
    pub fn from_raw(raw: u32) -> Result<Self, SocketError> {
        Self::from_bits(raw).ok_or(SocketError::InvalidArgs)
    }
}

bitflags! {
    /// Half-close selection for shutdown requests.
    ///
    /// Unknown bits in a raw shutdown word are tolerated and ignored,
    /// matching the original surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShutdownFlags: u32 {
        /// Renounce further reads on this endpoint
        const READ = 1 << 0;
        /// Renounce further writes from this endpoint
        const WRITE = 1 << 1;
    }
}

impl ShutdownFlags {
    /// Interprets a raw shutdown word, discarding unrecognized bits.
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }
}

bitflags! {
    /// The observable readiness bitset of an endpoint.
    ///
    /// Bits 24..=31 are reserved for user-defined signals and are the only
    /// bits user-signal operations may touch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Signals: u32 {
        /// Buffered bytes or frames are available to read
        const READABLE = 1 << 0;
        /// The peer's inbound pipeline can accept at least one byte
        const WRITABLE = 1 << 1;
        /// The peer endpoint is gone
        const PEER_CLOSED = 1 << 2;
        /// Reads are disabled and no buffered data remains
        const READ_DISABLED = 1 << 4;
        /// Writes from this endpoint are disabled
        const WRITE_DISABLED = 1 << 5;
        /// The local control slot holds a message
        const CONTROL_READABLE = 1 << 6;
        /// The peer's control slot is free
        const CONTROL_WRITABLE = 1 << 7;
        /// The local accept slot holds a handle
        const ACCEPT = 1 << 8;
        /// The peer's accept slot is free
        const SHARE = 1 << 9;
        /// User signal 0
        const USER_0 = 1 << 24;
        /// User signal 1
        const USER_1 = 1 << 25;
        /// User signal 2
        const USER_2 = 1 << 26;
        /// User signal 3
        const USER_3 = 1 << 27;
        /// User signal 4
        const USER_4 = 1 << 28;
        /// User signal 5
        const USER_5 = 1 << 29;
        /// User signal 6
        const USER_6 = 1 << 30;
        /// User signal 7
        const USER_7 = 1 << 31;
    }
}

impl Signals {
    /// Mask covering every user-definable signal bit.
    pub const USER_ALL: Signals = Signals::USER_0
        .union(Signals::USER_1)
        .union(Signals::USER_2)
        .union(Signals::USER_3)
        .union(Signals::USER_4)
        .union(Signals::USER_5)
        .union(Signals::USER_6)
        .union(Signals::USER_7);

    /// Returns true when every set bit lies in the user-signal range.
    pub fn is_user_only(self) -> bool {
        Self::USER_ALL.contains(self)
    }
}

impl fmt::Display for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signals({:#010x})", self.bits())
    }
}

bitflags! {
    /// Rights carried on an endpoint handle.
    ///
    /// The dispatcher itself does not enforce rights; they are plumbing for
    /// embedders that maintain a handle table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Rights: u32 {
        /// Duplicate the handle
        const DUPLICATE = 1 << 0;
        /// Transfer the handle to another holder
        const TRANSFER = 1 << 1;
        /// Read data from the endpoint
        const READ = 1 << 2;
        /// Write data through the endpoint
        const WRITE = 1 << 3;
        /// Read properties
        const GET_PROPERTY = 1 << 6;
        /// Write properties
        const SET_PROPERTY = 1 << 7;
        /// Assert user signals locally
        const SIGNAL = 1 << 12;
        /// Assert user signals on the peer
        const SIGNAL_PEER = 1 << 13;
        /// Wait on signal transitions
        const WAIT = 1 << 14;
        /// Inspect diagnostic state
        const INSPECT = 1 << 15;
    }
}

impl Rights {
    /// Default rights granted to both handles returned by pair creation.
    pub const DEFAULT_SOCKET: Rights = Rights::DUPLICATE
        .union(Rights::TRANSFER)
        .union(Rights::READ)
        .union(Rights::WRITE)
        .union(Rights::GET_PROPERTY)
        .union(Rights::SET_PROPERTY)
        .union(Rights::SIGNAL)
        .union(Rights::SIGNAL_PEER)
        .union(Rights::WAIT)
        .union(Rights::INSPECT);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_flags_from_raw_valid() {
        let flags = CreateFlags::from_raw(0b111).unwrap();
        assert!(flags.contains(CreateFlags::DATAGRAM));
        assert!(flags.contains(CreateFlags::HAS_CONTROL));
        assert!(flags.contains(CreateFlags::HAS_ACCEPT));
    }

    #[test]
    fn test_create_flags_from_raw_unknown_bit() {
        assert_eq!(CreateFlags::from_raw(1 << 3), Err(SocketError::InvalidArgs));
        assert_eq!(
            CreateFlags::from_raw(0b111 | (1 << 16)),
            Err(SocketError::InvalidArgs)
        );
    }

    #[test]
    fn test_shutdown_flags_ignore_unknown_bits() {
        let how = ShutdownFlags::from_raw(0b10 | (1 << 7));
        assert_eq!(how, ShutdownFlags::WRITE);
    }

    #[test]
    fn test_user_signal_mask() {
        assert!(Signals::USER_3.is_user_only());
        assert!((Signals::USER_0 | Signals::USER_7).is_user_only());
        assert!(!(Signals::READABLE | Signals::USER_0).is_user_only());
        assert_eq!(Signals::USER_ALL.bits(), 0xff00_0000);
    }

    #[test]
    fn test_signal_display() {
        let s = Signals::READABLE | Signals::WRITABLE;
        assert_eq!(format!("{}", s), "Signals(0x00000003)");
    }

    #[test]
    fn test_default_socket_rights() {
        let rights = Rights::DEFAULT_SOCKET;
        assert!(rights.contains(Rights::READ | Rights::WRITE | Rights::TRANSFER));
        assert!(rights.contains(Rights::WAIT));
    }
}
