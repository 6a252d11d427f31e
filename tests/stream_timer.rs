#![cfg(any(target_os = "linux", target_os = "android"))]

use std::time::{Duration, Instant};

use sio::{OpFlags, OptionValue, Stream, StreamFlags, StreamKind, StreamOption};

mod util;
use util::{assert_would_block, init};

const RW: StreamFlags = StreamFlags::READ.union(StreamFlags::WRITE);

fn expirations(stream: &mut Stream, flags: OpFlags) -> sio::Result<u64> {
    let mut buf = [0u8; 8];
    stream.read(&mut buf, flags)?;
    Ok(u64::from_ne_bytes(buf))
}

#[test]
fn periodic_timer_fires() {
    init();
    let mut timer = Stream::open_timer(100, false, RW).unwrap();
    assert_eq!(timer.kind(), StreamKind::Timer);

    let start = Instant::now();
    for _ in 0..3 {
        let count = expirations(&mut timer, OpFlags::empty()).unwrap();
        assert!(count >= 1);
    }
    // Three expirations of a 100 ms periodic timer cannot complete sooner.
    assert!(start.elapsed() >= Duration::from_millis(250));

    // Re-arm with a 500 ms one-shot interval; 250 ms in, nothing is due.
    timer.write(&500u64.to_ne_bytes(), OpFlags::empty()).unwrap();
    std::thread::sleep(Duration::from_millis(250));
    assert_would_block(expirations(&mut timer, OpFlags::DONT_WAIT));

    timer.close().unwrap();
}

#[test]
fn oneshot_timer() {
    init();
    let mut timer = Stream::open_timer(50, true, RW).unwrap();

    assert_eq!(expirations(&mut timer, OpFlags::empty()).unwrap(), 1);
    // One-shot: no further expiry is pending.
    assert_would_block(expirations(&mut timer, OpFlags::DONT_WAIT));

    timer.close().unwrap();
}

#[test]
fn rearm_with_period() {
    init();
    let mut timer = Stream::open_timer(1_000, true, RW).unwrap();

    // Two words: 30 ms until the first expiry, then every 20 ms.
    let mut payload = Vec::new();
    payload.extend_from_slice(&30u64.to_ne_bytes());
    payload.extend_from_slice(&20u64.to_ne_bytes());
    assert_eq!(timer.write(&payload, OpFlags::empty()).unwrap(), 16);

    assert!(expirations(&mut timer, OpFlags::empty()).unwrap() >= 1);
    assert!(expirations(&mut timer, OpFlags::empty()).unwrap() >= 1);

    timer.close().unwrap();
}

#[test]
fn timer_options() {
    init();
    let mut timer = Stream::open_timer(100, false, RW).unwrap();

    assert_eq!(
        timer.get_option(StreamOption::TimerInterval).unwrap(),
        OptionValue::UInt(100)
    );
    assert_eq!(
        timer.get_option(StreamOption::TimerOneshot).unwrap(),
        OptionValue::Bool(false)
    );

    timer
        .set_option(StreamOption::TimerInterval, OptionValue::UInt(200))
        .unwrap();
    assert_eq!(
        timer.get_option(StreamOption::TimerInterval).unwrap(),
        OptionValue::UInt(200)
    );

    timer
        .set_option(StreamOption::TimerOneshot, OptionValue::Bool(true))
        .unwrap();
    assert_eq!(
        timer.get_option(StreamOption::TimerOneshot).unwrap(),
        OptionValue::Bool(true)
    );

    timer.close().unwrap();
}

#[test]
fn short_buffer_is_rejected() {
    init();
    let mut timer = Stream::open_timer(10, true, RW).unwrap();
    let mut small = [0u8; 4];
    assert_eq!(
        timer.read(&mut small, OpFlags::empty()).unwrap_err().kind(),
        sio::ErrorKind::BufferTooSmall
    );
    timer.close().unwrap();
}
