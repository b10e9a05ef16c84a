//! Stream-mode pipeline behavior: ordering, prefix writes, flow control.

use core_types::{CreateFlags, Signals, SocketError};
use sockets::PairConfig;
use tests_sockets::{
    pair_with_config, pattern, read_bytes, stream_pair, write_bytes,
};
use user_copy::{FaultingSource, SliceSource};

#[test]
fn test_stream_echo() {
    let (e0, e1) = stream_pair();

    assert_eq!(write_bytes(&e0, &[1, 2, 3, 4]), Ok(4));
    assert!(e1.signals().contains(Signals::READABLE));

    let data = read_bytes(&e1, 10).unwrap();
    assert_eq!(data, vec![1, 2, 3, 4]);
    assert!(!e1.signals().contains(Signals::READABLE));
}

#[test]
fn test_chunked_writes_concatenate() {
    let (e0, e1) = stream_pair();
    let payload = pattern(1000);

    // Any chunking on the writer side must be invisible to the reader.
    for chunk in payload.chunks(7) {
        assert_eq!(write_bytes(&e0, chunk), Ok(chunk.len()));
    }

    let mut collected = Vec::new();
    loop {
        match read_bytes(&e1, 13) {
            Ok(chunk) => collected.extend(chunk),
            Err(SocketError::ShouldWait) => break,
            Err(other) => panic!("unexpected read error: {other}"),
        }
    }
    assert_eq!(collected, payload);
}

#[test]
fn test_partial_write_reports_accepted_prefix() {
    let config = PairConfig::new().with_capacity(8);
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);

    // Only 8 of 12 bytes fit; the accepted prefix is success, not an error.
    assert_eq!(write_bytes(&e0, &pattern(12)), Ok(8));
    assert_eq!(read_bytes(&e1, 12).unwrap(), pattern(8));
}

#[test]
fn test_write_to_full_pipeline_reports_flow_control() {
    let config = PairConfig::new().with_capacity(4);
    let (e0, _e1) = pair_with_config(CreateFlags::empty(), config);

    assert_eq!(write_bytes(&e0, &[1, 2, 3, 4]), Ok(4));
    assert_eq!(write_bytes(&e0, &[5]), Err(SocketError::ShouldWait));
}

#[test]
fn test_writable_clears_on_fill_and_returns_on_drain() {
    let config = PairConfig::new().with_capacity(4);
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);

    assert!(e0.signals().contains(Signals::WRITABLE));

    // Filling the peer's pipeline exactly withdraws our writability.
    write_bytes(&e0, &[1, 2, 3, 4]).unwrap();
    assert!(!e0.signals().contains(Signals::WRITABLE));

    // A drain that frees space re-raises it.
    read_bytes(&e1, 2).unwrap();
    assert!(e0.signals().contains(Signals::WRITABLE));
}

#[test]
fn test_readable_raised_only_when_bytes_land() {
    let (e0, e1) = stream_pair();

    assert_eq!(write_bytes(&e0, &[]), Ok(0));
    assert!(!e1.signals().contains(Signals::READABLE));

    write_bytes(&e0, &[1]).unwrap();
    assert!(e1.signals().contains(Signals::READABLE));
}

#[test]
fn test_copy_fault_is_invalid_args() {
    let (e0, e1) = stream_pair();
    let data = pattern(64);
    let faulty = FaultingSource::new(SliceSource::new(&data), 10);

    assert_eq!(e0.write(&faulty, 64), Err(SocketError::InvalidArgs));
    // Nothing landed on the peer.
    assert_eq!(e1.read(None, 0), Ok(0));
    assert!(!e1.signals().contains(Signals::READABLE));
}

#[test]
fn test_oversized_length_rejected() {
    let (e0, _e1) = stream_pair();
    let data = [0u8; 1];
    assert_eq!(
        e0.write(&SliceSource::new(&data), (u32::MAX as usize) + 1),
        Err(SocketError::InvalidArgs)
    );
}

#[test]
fn test_interleaved_write_read_preserves_order() {
    let config = PairConfig::new().with_capacity(16);
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);
    let payload = pattern(200);
    let mut collected = Vec::new();
    let mut offset = 0;

    while collected.len() < payload.len() {
        if offset < payload.len() {
            let end = payload.len().min(offset + 5);
            match write_bytes(&e0, &payload[offset..end]) {
                Ok(n) => offset += n,
                Err(SocketError::ShouldWait) => {}
                Err(other) => panic!("unexpected write error: {other}"),
            }
        }
        match read_bytes(&e1, 3) {
            Ok(chunk) => collected.extend(chunk),
            Err(SocketError::ShouldWait) => {}
            Err(other) => panic!("unexpected read error: {other}"),
        }
    }
    assert_eq!(collected, payload);
}
