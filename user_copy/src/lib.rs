//! # User Copy
//!
//! This crate defines the boundary between the dispatcher and external
//! buffers. The dispatcher never touches caller memory directly; every
//! transfer goes through the [`UserSource`] / [`UserSink`] contract.
//!
//! ## Philosophy
//!
//! - **Opaque buffers**: the dispatcher sees copy operations, not pointers.
//! - **Offset-aware**: partial stream writes and truncated datagram reads
//!   copy sub-ranges without double-buffering.
//! - **Deterministic failure**: the faulting adapters let tests exercise
//!   every copy-error path without unsafe code or real fault hardware.
//!
//! ## Non-Goals
//!
//! This is NOT an address-space or page-table abstraction. Real kernels
//! implement these traits over their user-memory primitives; tests and
//! in-process embedders use the slice adapters.

use thiserror::Error;

/// Error returned when a user-memory copy fails
///
/// The dispatcher maps this to its `InvalidArgs` error kind: a bad caller
/// buffer is a caller mistake, not a dispatcher state.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("user-memory copy failed")]
pub struct CopyError;

/// A readable external buffer: the source of a write.
///
/// `offset` addresses into the caller's buffer, so a stream write that only
/// has room for a prefix can copy exactly that prefix, and a retry after
/// flow control can resume where it left off.
pub trait UserSource {
    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    fn copy_from_user(&self, offset: usize, dst: &mut [u8]) -> Result<(), CopyError>;
}

/// A writable external buffer: the destination of a read.
pub trait UserSink {
    /// Copies `src` into the caller's buffer starting at `offset`.
    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), CopyError>;
}

/// In-process [`UserSource`] over a byte slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    /// Wraps a slice as a user source.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl UserSource for SliceSource<'_> {
    fn copy_from_user(&self, offset: usize, dst: &mut [u8]) -> Result<(), CopyError> {
        let end = offset.checked_add(dst.len()).ok_or(CopyError)?;
        let src = self.data.get(offset..end).ok_or(CopyError)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// In-process [`UserSink`] over a mutable byte slice.
#[derive(Debug)]
pub struct SliceSink<'a> {
    data: &'a mut [u8],
}

impl<'a> SliceSink<'a> {
    /// Wraps a mutable slice as a user sink.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Returns the length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl UserSink for SliceSink<'_> {
    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), CopyError> {
        let end = offset.checked_add(src.len()).ok_or(CopyError)?;
        let dst = self.data.get_mut(offset..end).ok_or(CopyError)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// A [`UserSource`] that fails deterministically once a byte budget is spent.
///
/// Wraps another source and rejects any copy that would reach past
/// `fail_after` total bytes from the start of the buffer. Used by tests to
/// drive the copy-error paths of the dispatcher.
#[derive(Debug)]
pub struct FaultingSource<S> {
    inner: S,
    fail_after: usize,
}

impl<S> FaultingSource<S> {
    /// Wraps `inner`, faulting any access past `fail_after` bytes.
    pub fn new(inner: S, fail_after: usize) -> Self {
        Self { inner, fail_after }
    }
}

impl<S: UserSource> UserSource for FaultingSource<S> {
    fn copy_from_user(&self, offset: usize, dst: &mut [u8]) -> Result<(), CopyError> {
        let end = offset.checked_add(dst.len()).ok_or(CopyError)?;
        if end > self.fail_after {
            return Err(CopyError);
        }
        self.inner.copy_from_user(offset, dst)
    }
}

/// A [`UserSink`] that fails deterministically once a byte budget is spent.
#[derive(Debug)]
pub struct FaultingSink<S> {
    inner: S,
    fail_after: usize,
}

impl<S> FaultingSink<S> {
    /// Wraps `inner`, faulting any access past `fail_after` bytes.
    pub fn new(inner: S, fail_after: usize) -> Self {
        Self { inner, fail_after }
    }
}

impl<S: UserSink> UserSink for FaultingSink<S> {
    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), CopyError> {
        let end = offset.checked_add(src.len()).ok_or(CopyError)?;
        if end > self.fail_after {
            return Err(CopyError);
        }
        self.inner.copy_to_user(offset, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source_full_copy() {
        let src = SliceSource::new(&[1, 2, 3, 4]);
        let mut out = [0u8; 4];
        src.copy_from_user(0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_slice_source_offset_copy() {
        let src = SliceSource::new(&[1, 2, 3, 4, 5]);
        let mut out = [0u8; 2];
        src.copy_from_user(2, &mut out).unwrap();
        assert_eq!(out, [3, 4]);
    }

    #[test]
    fn test_slice_source_out_of_bounds() {
        let src = SliceSource::new(&[1, 2, 3]);
        let mut out = [0u8; 4];
        assert_eq!(src.copy_from_user(0, &mut out), Err(CopyError));
        assert_eq!(src.copy_from_user(3, &mut out[..1]), Err(CopyError));
    }

    #[test]
    fn test_slice_sink_offset_copy() {
        let mut buf = [0u8; 5];
        let mut sink = SliceSink::new(&mut buf);
        sink.copy_to_user(1, &[9, 9]).unwrap();
        assert_eq!(buf, [0, 9, 9, 0, 0]);
    }

    #[test]
    fn test_slice_sink_out_of_bounds() {
        let mut buf = [0u8; 2];
        let mut sink = SliceSink::new(&mut buf);
        assert_eq!(sink.copy_to_user(1, &[7, 7]), Err(CopyError));
    }

    #[test]
    fn test_faulting_source_budget() {
        let data = [5u8; 8];
        let src = FaultingSource::new(SliceSource::new(&data), 4);
        let mut out = [0u8; 5];
        src.copy_from_user(0, &mut out[..4]).unwrap();
        assert_eq!(src.copy_from_user(0, &mut out[..5]), Err(CopyError));
        assert_eq!(src.copy_from_user(4, &mut out[..1]), Err(CopyError));
    }

    #[test]
    fn test_faulting_sink_budget() {
        let mut buf = [0u8; 8];
        let mut sink = FaultingSink::new(SliceSink::new(&mut buf), 3);
        sink.copy_to_user(0, &[1, 2, 3]).unwrap();
        assert_eq!(sink.copy_to_user(3, &[4]), Err(CopyError));
    }
}
