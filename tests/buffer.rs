use sio::{Buffer, BufferPool, ErrorKind, GrowthStrategy};

mod util;
use util::{assert_end_of_stream, init, temp_path};

#[test]
fn binary_values_round_trip() {
    init();
    let mut buf = Buffer::with_capacity(0).unwrap();

    buf.write_u8(0x42).unwrap();
    buf.write_u16(0xABCD).unwrap();
    buf.write_u32(0x1234_5678).unwrap();
    buf.write_u64(0x0123_4567_89AB_CDEF).unwrap();

    buf.seek(0).unwrap();
    assert_eq!(buf.read_u8().unwrap(), 0x42);
    assert_eq!(buf.read_u16().unwrap(), 0xABCD);
    assert_eq!(buf.read_u32().unwrap(), 0x1234_5678);
    assert_eq!(buf.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);

    assert!(buf.at_end());
    assert_eq!(buf.read_u8().unwrap_err().kind(), ErrorKind::EndOfStream);
}

#[test]
fn bytes_round_trip() {
    init();
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let mut buf = Buffer::with_capacity(16).unwrap();
    buf.write(&payload).unwrap();
    assert_eq!(buf.len(), payload.len());
    assert!(buf.capacity() >= buf.len());

    buf.seek(0).unwrap();
    let mut out = vec![0u8; payload.len()];
    assert_eq!(buf.read(&mut out).unwrap(), payload.len());
    assert_eq!(out, payload);

    let mut one = [0u8; 1];
    assert_end_of_stream(buf.read(&mut one));
    assert_eq!(buf.position(), buf.len());
}

#[test]
fn growth_strategies() {
    init();
    let mut fixed = Buffer::with_strategy(16, GrowthStrategy::Fixed, 0).unwrap();
    fixed.write(&[0u8; 16]).unwrap();
    assert_eq!(
        fixed.write(&[0]).unwrap_err().kind(),
        ErrorKind::BufferTooSmall
    );

    let mut double = Buffer::with_strategy(16, GrowthStrategy::Double, 0).unwrap();
    double.write(&[0u8; 100]).unwrap();
    assert_eq!(double.capacity(), 128);

    let mut linear = Buffer::with_strategy(16, GrowthStrategy::Linear, 100).unwrap();
    linear.write(&[0u8; 100]).unwrap();
    assert_eq!(linear.capacity(), 116);
}

#[test]
fn clear_and_shrink() {
    init();
    let mut buf = Buffer::with_capacity(64).unwrap();
    buf.write(b"some bytes").unwrap();

    let capacity = buf.capacity();
    buf.clear();
    assert_eq!((buf.len(), buf.position(), buf.capacity()), (0, 0, capacity));

    buf.write(b"1234").unwrap();
    buf.shrink_to_fit().unwrap();
    assert_eq!(buf.capacity(), 8); // word-aligned
    assert_eq!(buf.as_slice(), b"1234");
}

#[test]
fn mmap_round_trip() {
    init();
    let path = temp_path("mmap.bin");
    std::fs::write(&path, b"mapped contents").unwrap();

    let mut map = Buffer::mmap_file(&path, true).unwrap();
    assert!(map.is_mmap());
    assert_eq!(map.capacity(), map.len());
    assert_eq!(map.len(), 15);

    let mut out = [0u8; 64];
    let n = map.read(&mut out).unwrap();
    assert_eq!(&out[..n], b"mapped contents");

    // Read-only mappings refuse writes outright.
    assert_eq!(map.write(b"x").unwrap_err().kind(), ErrorKind::ReadOnly);

    let mut rw = Buffer::mmap_file(&path, false).unwrap();
    rw.write(b"MAPPED").unwrap();
    // And fixed capacity means no growth past the file length.
    rw.seek(rw.len()).unwrap();
    assert_eq!(rw.write(b"x").unwrap_err().kind(), ErrorKind::BufferTooSmall);
    drop(rw);

    assert_eq!(std::fs::read(&path).unwrap(), b"MAPPED contents");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn pool_lifecycle() {
    init();
    let mut pool = BufferPool::new(4, 1024).unwrap();

    let mut held = Vec::new();
    for _ in 0..4 {
        let index = pool.acquire().unwrap();
        pool.get_mut(index).unwrap().write(b"junk").unwrap();
        held.push(index);
    }
    assert_eq!(pool.in_use(), 4);
    assert_eq!(pool.acquire().unwrap_err().kind(), ErrorKind::Busy);

    pool.release(held[0]).unwrap();
    let index = pool.acquire().unwrap();
    assert_eq!(index, held[0]);
    // Reacquired buffers come back cleared.
    assert_eq!(pool.get(index).unwrap().len(), 0);

    pool.release(index).unwrap();
    assert_eq!(
        pool.release(index).unwrap_err().kind(),
        ErrorKind::AlreadyClosed
    );
}

#[test]
fn pool_resize() {
    init();
    let mut pool = BufferPool::new(2, 256).unwrap();
    let _a = pool.acquire().unwrap();
    let _b = pool.acquire().unwrap();

    assert_eq!(pool.resize(1).unwrap_err().kind(), ErrorKind::Busy);

    pool.resize(3).unwrap();
    assert_eq!(pool.capacity(), 3);
    let _c = pool.acquire().unwrap();
    assert_eq!(pool.in_use(), 3);
}
