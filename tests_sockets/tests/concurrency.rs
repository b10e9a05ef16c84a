//! Cross-thread behavior: flow-controlled round trips, datagram atomicity,
//! and teardown racing live traffic.

use core_types::{CreateFlags, ShutdownFlags, Signals, SocketError};
use sockets::PairConfig;
use std::thread;
use std::time::Duration;
use tests_sockets::{
    pair_with_config, pattern, read_bytes, write_bytes, SignalWaiter,
};

#[test]
fn test_threaded_stream_roundtrip_preserves_bytes() {
    let waiter = SignalWaiter::new();
    let config = PairConfig::new()
        .with_capacity(512)
        .with_observer(waiter.clone());
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);

    let payload = pattern(64 * 1024);
    let expected = payload.clone();

    thread::scope(|scope| {
        let writer_waiter = waiter.clone();
        scope.spawn(move || {
            let mut offset = 0;
            while offset < payload.len() {
                match write_bytes(&e0, &payload[offset..]) {
                    Ok(n) => offset += n,
                    Err(SocketError::ShouldWait) => {
                        writer_waiter.wait_for(
                            &e0,
                            Signals::WRITABLE,
                            Duration::from_secs(5),
                        );
                    }
                    Err(other) => panic!("unexpected write error: {other}"),
                }
            }
            e0.shutdown(ShutdownFlags::WRITE).unwrap();
        });

        let mut collected = Vec::with_capacity(expected.len());
        loop {
            match read_bytes(&e1, 4096) {
                Ok(chunk) => collected.extend(chunk),
                Err(SocketError::ShouldWait) => {
                    waiter.wait_for(
                        &e1,
                        Signals::READABLE | Signals::READ_DISABLED,
                        Duration::from_secs(5),
                    );
                }
                Err(SocketError::BadState) => break,
                Err(other) => panic!("unexpected read error: {other}"),
            }
        }
        assert_eq!(collected, expected);
    });
}

#[test]
fn test_concurrent_datagram_writers_keep_frames_atomic() {
    let waiter = SignalWaiter::new();
    let config = PairConfig::new()
        .with_capacity(256)
        .with_observer(waiter.clone());
    let (e0, e1) = pair_with_config(CreateFlags::DATAGRAM, config);

    const FRAMES_PER_WRITER: usize = 200;
    const FRAME_LEN: usize = 32;

    thread::scope(|scope| {
        for fill in [0xAAu8, 0xBBu8] {
            let writer = e0.clone();
            let writer_waiter = waiter.clone();
            scope.spawn(move || {
                let frame = vec![fill; FRAME_LEN];
                let mut sent = 0;
                while sent < FRAMES_PER_WRITER {
                    match write_bytes(&writer, &frame) {
                        Ok(n) => {
                            assert_eq!(n, FRAME_LEN);
                            sent += 1;
                        }
                        Err(SocketError::ShouldWait) => {
                            writer_waiter.wait_for(
                                &writer,
                                Signals::WRITABLE,
                                Duration::from_secs(5),
                            );
                        }
                        Err(other) => panic!("unexpected write error: {other}"),
                    }
                }
            });
        }

        let mut received = 0;
        let mut per_fill = [0usize; 2];
        while received < 2 * FRAMES_PER_WRITER {
            match read_bytes(&e1, FRAME_LEN) {
                Ok(frame) => {
                    assert_eq!(frame.len(), FRAME_LEN);
                    // A frame is never interleaved with another writer's.
                    assert!(frame.iter().all(|&b| b == frame[0]));
                    match frame[0] {
                        0xAA => per_fill[0] += 1,
                        0xBB => per_fill[1] += 1,
                        other => panic!("unexpected frame fill: {other:#x}"),
                    }
                    received += 1;
                }
                Err(SocketError::ShouldWait) => {
                    waiter.wait_for(&e1, Signals::READABLE, Duration::from_secs(5));
                }
                Err(other) => panic!("unexpected read error: {other}"),
            }
        }
        assert_eq!(per_fill, [FRAMES_PER_WRITER, FRAMES_PER_WRITER]);
    });
}

#[test]
fn test_teardown_races_live_writer() {
    let waiter = SignalWaiter::new();
    let config = PairConfig::new()
        .with_capacity(64)
        .with_observer(waiter.clone());
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);

    thread::scope(|scope| {
        scope.spawn(move || {
            let chunk = [1u8; 16];
            loop {
                match write_bytes(&e0, &chunk) {
                    Ok(_) => {}
                    Err(SocketError::ShouldWait) => thread::yield_now(),
                    // The reader went away mid-stream; both terminal
                    // outcomes are acceptable depending on the interleaving.
                    Err(SocketError::PeerClosed) | Err(SocketError::BadState) => break,
                    Err(other) => panic!("unexpected write error: {other}"),
                }
            }
            assert!(e0.signals().contains(Signals::PEER_CLOSED));
        });

        // Let the writer make some progress, then vanish.
        read_bytes(&e1, 16).ok();
        drop(e1);
    });
}

#[test]
fn test_concurrent_user_signals_and_data() {
    let config = PairConfig::new().with_capacity(1024);
    let (e0, e1) = pair_with_config(CreateFlags::empty(), config);

    thread::scope(|scope| {
        let signaler = e0.clone();
        scope.spawn(move || {
            for _ in 0..500 {
                signaler
                    .user_signal(Signals::empty(), Signals::USER_0, true)
                    .unwrap();
                signaler
                    .user_signal(Signals::USER_0, Signals::empty(), true)
                    .unwrap();
            }
        });

        for _ in 0..200 {
            write_bytes(&e0, &[3; 4]).unwrap();
            loop {
                match read_bytes(&e1, 4) {
                    Ok(chunk) => {
                        assert_eq!(chunk, vec![3; 4]);
                        break;
                    }
                    Err(SocketError::ShouldWait) => thread::yield_now(),
                    Err(other) => panic!("unexpected read error: {other}"),
                }
            }
        }
    });

    // User-signal churn never leaks into the data bits.
    assert!(!e1.signals().contains(Signals::READABLE));
}
