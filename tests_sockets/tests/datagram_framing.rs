//! Datagram-mode framing: atomicity, ordering, truncation.

use core_types::{CreateFlags, Signals, SocketError};
use sockets::PairConfig;
use tests_sockets::{datagram_pair, pair_with_config, read_bytes, write_bytes};

#[test]
fn test_datagram_atomicity_and_truncation() {
    let (e0, e1) = datagram_pair();

    assert_eq!(write_bytes(&e0, &[b'A'; 10]), Ok(10));
    assert_eq!(write_bytes(&e0, &[b'B'; 5]), Ok(5));

    // A three-byte read consumes the whole first frame; the other seven
    // bytes are discarded with it.
    assert_eq!(read_bytes(&e1, 3).unwrap(), vec![b'A'; 3]);
    assert_eq!(read_bytes(&e1, 100).unwrap(), vec![b'B'; 5]);
    assert_eq!(read_bytes(&e1, 100), Err(SocketError::ShouldWait));
}

#[test]
fn test_frames_never_merge() {
    let (e0, e1) = datagram_pair();

    write_bytes(&e0, &[1, 2]).unwrap();
    write_bytes(&e0, &[3, 4]).unwrap();

    // Each read returns exactly one frame even when the buffer has room
    // for both.
    assert_eq!(read_bytes(&e1, 100).unwrap(), vec![1, 2]);
    assert_eq!(read_bytes(&e1, 100).unwrap(), vec![3, 4]);
}

#[test]
fn test_whole_frame_or_nothing() {
    let config = PairConfig::new().with_capacity(16);
    let (e0, e1) = pair_with_config(CreateFlags::DATAGRAM, config);

    // 4 + 12 fills the pipeline exactly.
    assert_eq!(write_bytes(&e0, &[7; 12]), Ok(12));
    // The next frame does not fit and must not be split.
    assert_eq!(write_bytes(&e0, &[8; 2]), Err(SocketError::ShouldWait));

    assert_eq!(read_bytes(&e1, 12).unwrap(), vec![7; 12]);
    assert_eq!(write_bytes(&e0, &[8; 2]), Ok(2));
}

#[test]
fn test_oversized_frame_never_fits() {
    let config = PairConfig::new().with_capacity(16);
    let (e0, _e1) = pair_with_config(CreateFlags::DATAGRAM, config);

    // Frame maximum is capacity minus the 32-bit length prefix.
    assert_eq!(write_bytes(&e0, &[1; 13]), Err(SocketError::ShouldWait));
    assert_eq!(write_bytes(&e0, &[1; 12]), Ok(12));
}

#[test]
fn test_byte_count_query_sums_payloads() {
    let (e0, e1) = datagram_pair();

    write_bytes(&e0, &[1; 10]).unwrap();
    write_bytes(&e0, &[2; 5]).unwrap();

    assert_eq!(e1.read(None, 0), Ok(15));
}

#[test]
fn test_writable_tracks_frame_capacity() {
    let config = PairConfig::new().with_capacity(16);
    let (e0, e1) = pair_with_config(CreateFlags::DATAGRAM, config);

    write_bytes(&e0, &[9; 12]).unwrap();
    // 16 of 16 accounted: not even an empty frame fits now.
    assert!(!e0.signals().contains(Signals::WRITABLE));

    read_bytes(&e1, 12).unwrap();
    assert!(e0.signals().contains(Signals::WRITABLE));
}

#[test]
fn test_zero_length_read_buffer_still_consumes_frame() {
    let (e0, e1) = datagram_pair();

    write_bytes(&e0, &[5; 4]).unwrap();
    write_bytes(&e0, &[6; 4]).unwrap();

    // Truncation to a zero-length buffer is still a full consume.
    assert_eq!(read_bytes(&e1, 0).unwrap(), Vec::<u8>::new());
    assert_eq!(read_bytes(&e1, 100).unwrap(), vec![6; 4]);
}
