//! Bounded inbound data pipeline.
//!
//! Each endpoint owns one pipeline; the peer writes into it and local
//! readers drain it. Stream pipelines queue raw bytes and allow prefix
//! writes; datagram pipelines queue discrete frames, each accounted with a
//! 32-bit length prefix, and accept or reject a frame as a whole.

use core_types::DATAGRAM_HEADER_BYTES;
use std::collections::VecDeque;
use user_copy::{UserSink, UserSource};

/// Pipeline error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// No room for the requested write until the reader drains
    Full,
    /// The user-memory copy failed; nothing was consumed
    CopyFailed,
}

#[derive(Debug)]
enum PipelineKind {
    Stream {
        bytes: VecDeque<u8>,
    },
    Datagram {
        frames: VecDeque<Vec<u8>>,
        /// Bytes of capacity in use, counting the per-frame header
        accounted: usize,
    },
}

/// Bounded byte pipeline with stream or datagram discipline.
#[derive(Debug)]
pub struct DataPipeline {
    capacity: usize,
    kind: PipelineKind,
}

impl DataPipeline {
    /// Creates a stream pipeline with the given byte capacity.
    pub fn stream(capacity: usize) -> Self {
        Self {
            capacity,
            kind: PipelineKind::Stream {
                bytes: VecDeque::new(),
            },
        }
    }

    /// Creates a datagram pipeline with the given byte capacity.
    pub fn datagram(capacity: usize) -> Self {
        Self {
            capacity,
            kind: PipelineKind::Datagram {
                frames: VecDeque::new(),
                accounted: 0,
            },
        }
    }

    /// Returns the configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffered payload bytes.
    ///
    /// Datagram header accounting is internal and excluded here; this is
    /// the value the byte-count query reports to callers.
    pub fn size(&self) -> usize {
        match &self.kind {
            PipelineKind::Stream { bytes } => bytes.len(),
            PipelineKind::Datagram { frames, accounted } => {
                accounted - DATAGRAM_HEADER_BYTES * frames.len()
            }
        }
    }

    /// Returns whether no bytes or frames remain.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            PipelineKind::Stream { bytes } => bytes.is_empty(),
            PipelineKind::Datagram { frames, .. } => frames.is_empty(),
        }
    }

    /// Returns whether no further write can make progress.
    pub fn is_full(&self) -> bool {
        match &self.kind {
            PipelineKind::Stream { bytes } => bytes.len() >= self.capacity,
            PipelineKind::Datagram { accounted, .. } => {
                accounted + DATAGRAM_HEADER_BYTES > self.capacity
            }
        }
    }

    /// Writes up to `len` bytes from `src`.
    ///
    /// Stream mode accepts the largest prefix that fits and returns its
    /// length; `Full` is reported only when the pipeline was already at
    /// capacity. Datagram mode queues the whole frame or, if `4 + len`
    /// does not fit, reports `Full` without consuming anything.
    pub fn write(&mut self, src: &dyn UserSource, len: usize) -> Result<usize, PipelineError> {
        match &mut self.kind {
            PipelineKind::Stream { bytes } => {
                let available = self.capacity - bytes.len();
                if available == 0 {
                    return Err(PipelineError::Full);
                }
                let chunk_len = available.min(len);
                let mut chunk = vec![0u8; chunk_len];
                src.copy_from_user(0, &mut chunk)
                    .map_err(|_| PipelineError::CopyFailed)?;
                bytes.extend(chunk);
                Ok(chunk_len)
            }
            PipelineKind::Datagram { frames, accounted } => {
                let needed = DATAGRAM_HEADER_BYTES
                    .checked_add(len)
                    .ok_or(PipelineError::Full)?;
                if needed > self.capacity - *accounted {
                    return Err(PipelineError::Full);
                }
                let mut frame = vec![0u8; len];
                src.copy_from_user(0, &mut frame)
                    .map_err(|_| PipelineError::CopyFailed)?;
                frames.push_back(frame);
                *accounted += needed;
                Ok(len)
            }
        }
    }

    /// Reads up to `len` bytes into `dst`.
    ///
    /// Stream mode returns a prefix of the queued bytes. Datagram mode
    /// always consumes exactly one frame: the copy is truncated to `len`
    /// and the rest of that frame is discarded.
    ///
    /// Nothing is consumed when the copy fails.
    pub fn read(&mut self, dst: &mut dyn UserSink, len: usize) -> Result<usize, PipelineError> {
        match &mut self.kind {
            PipelineKind::Stream { bytes } => {
                let n = len.min(bytes.len());
                if n == 0 {
                    return Ok(0);
                }
                let (front, back) = bytes.as_slices();
                let from_front = n.min(front.len());
                dst.copy_to_user(0, &front[..from_front])
                    .map_err(|_| PipelineError::CopyFailed)?;
                if n > from_front {
                    dst.copy_to_user(from_front, &back[..n - from_front])
                        .map_err(|_| PipelineError::CopyFailed)?;
                }
                bytes.drain(..n);
                Ok(n)
            }
            PipelineKind::Datagram { frames, accounted } => {
                let n = match frames.front() {
                    Some(frame) => {
                        let n = len.min(frame.len());
                        if n > 0 {
                            dst.copy_to_user(0, &frame[..n])
                                .map_err(|_| PipelineError::CopyFailed)?;
                        }
                        n
                    }
                    None => return Ok(0),
                };
                if let Some(frame) = frames.pop_front() {
                    *accounted -= DATAGRAM_HEADER_BYTES + frame.len();
                }
                Ok(n)
            }
        }
    }
}
