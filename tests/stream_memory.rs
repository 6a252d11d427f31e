use std::io::SeekFrom;

use sio::{
    Buffer, ErrorKind, OpFlags, OptionValue, Stream, StreamFlags, StreamKind, StreamOption,
};

mod util;
use util::{assert_end_of_stream, init};

const RW: StreamFlags = StreamFlags::READ.union(StreamFlags::WRITE);

#[test]
fn buffer_stream_round_trip() {
    init();
    let mut stream = Stream::open_buffer(Buffer::new().unwrap(), RW).unwrap();
    assert_eq!(stream.kind(), StreamKind::Buffer);

    assert_eq!(stream.write(b"buffered bytes", OpFlags::DOALL).unwrap(), 14);
    assert_eq!(stream.seek(SeekFrom::Start(0)).unwrap(), 0);

    let mut out = [0u8; 64];
    assert_eq!(stream.read(&mut out, OpFlags::empty()).unwrap(), 14);
    assert_eq!(&out[..14], b"buffered bytes");

    assert_end_of_stream(stream.read(&mut out, OpFlags::empty()));
    assert!(stream.eof());

    // Seeking exactly to the size is legal and stays at end-of-stream.
    assert_eq!(stream.seek(SeekFrom::Start(14)).unwrap(), 14);
    assert!(stream.eof());

    stream.close().unwrap();
    assert_eq!(stream.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);
}

#[test]
fn buffer_stream_truncate() {
    init();
    let mut stream = Stream::open_buffer(Buffer::with_capacity(64).unwrap(), RW).unwrap();
    stream.write(b"0123456789", OpFlags::DOALL).unwrap();

    // Truncate to the current size is a no-op.
    stream.truncate(10).unwrap();
    assert_eq!(stream.size().unwrap(), 10);

    // Shrinking pulls the cursor back inside the new size.
    stream.truncate(4).unwrap();
    assert_eq!(stream.size().unwrap(), 4);
    assert_eq!(
        stream.get_option(StreamOption::Position).unwrap(),
        OptionValue::UInt(4)
    );

    // Growing zero-fills the new region.
    stream.truncate(8).unwrap();
    assert_eq!(stream.size().unwrap(), 8);
    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut out = [0u8; 8];
    assert_eq!(stream.read(&mut out, OpFlags::DOALL).unwrap(), 8);
    assert_eq!(&out, b"0123\0\0\0\0");

    stream.close().unwrap();
}

#[test]
fn buffer_stream_capacity_option() {
    init();
    let mut stream = Stream::open_buffer(Buffer::with_capacity(64).unwrap(), RW).unwrap();

    let capacity = stream
        .get_option(StreamOption::BufferSize)
        .unwrap()
        .as_uint()
        .unwrap();
    assert_eq!(capacity, 64);

    stream
        .set_option(StreamOption::BufferSize, OptionValue::UInt(256))
        .unwrap();
    assert_eq!(
        stream.get_option(StreamOption::BufferSize).unwrap(),
        OptionValue::UInt(256)
    );

    stream.close().unwrap();
}

#[test]
fn buffer_stream_vectored_fallback() {
    init();
    let mut stream = Stream::open_buffer(Buffer::new().unwrap(), RW).unwrap();

    let parts = [
        std::io::IoSlice::new(b"scatter "),
        std::io::IoSlice::new(b"gather"),
    ];
    assert_eq!(stream.write_vectored(&parts, OpFlags::empty()).unwrap(), 14);

    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut first = [0u8; 8];
    let mut second = [0u8; 6];
    let mut bufs = [
        std::io::IoSliceMut::new(&mut first),
        std::io::IoSliceMut::new(&mut second),
    ];
    assert_eq!(stream.read_vectored(&mut bufs, OpFlags::empty()).unwrap(), 14);
    assert_eq!(&first, b"scatter ");
    assert_eq!(&second, b"gather");

    stream.close().unwrap();
}

#[test]
fn raw_memory_stream() {
    init();
    let mut storage = *b"................";
    let mut stream =
        unsafe { Stream::open_memory(storage.as_mut_ptr(), storage.len(), RW) }.unwrap();
    assert_eq!(stream.kind(), StreamKind::Memory);

    assert_eq!(stream.write(b"fixed span", OpFlags::DOALL).unwrap(), 10);
    assert_eq!(stream.seek(SeekFrom::Start(0)).unwrap(), 0);

    let mut out = [0u8; 10];
    assert_eq!(stream.read(&mut out, OpFlags::DOALL).unwrap(), 10);
    assert_eq!(&out, b"fixed span");

    // The span is fixed: writes stop at its end, truncate is unsupported.
    stream.seek(SeekFrom::End(0)).unwrap();
    assert_end_of_stream(stream.write(b"x", OpFlags::empty()));
    assert_eq!(stream.truncate(4).unwrap_err().kind(), ErrorKind::Unsupported);

    // Short write over the remaining tail.
    stream.seek(SeekFrom::Start(14)).unwrap();
    assert_eq!(stream.write(b"abcdef", OpFlags::empty()).unwrap(), 2);

    stream.close().unwrap();
    assert_eq!(stream.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);

    // The caller keeps the memory.
    assert_eq!(&storage[..10], b"fixed span");
    assert_eq!(&storage[14..], b"ab");
}

#[test]
fn raw_memory_bounds() {
    init();
    let mut storage = [0u8; 8];
    let mut stream =
        unsafe { Stream::open_memory(storage.as_mut_ptr(), storage.len(), RW) }.unwrap();

    assert_eq!(
        stream.seek(SeekFrom::Start(9)).unwrap_err().kind(),
        ErrorKind::InvalidParam
    );
    assert_eq!(
        stream.seek(SeekFrom::Current(-1)).unwrap_err().kind(),
        ErrorKind::InvalidParam
    );
    assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 8);
    assert!(stream.eof());

    let mut out = [0u8; 1];
    assert_end_of_stream(stream.read(&mut out, OpFlags::empty()));
    assert_eq!(stream.read(&mut [], OpFlags::empty()).unwrap(), 0);

    stream.close().unwrap();
}

#[test]
fn fixed_buffer_refuses_growth() {
    init();
    let mut stream = Stream::open_buffer(
        Buffer::with_strategy(8, sio::GrowthStrategy::Fixed, 0).unwrap(),
        RW,
    )
    .unwrap();

    stream.write(b"12345678", OpFlags::empty()).unwrap();
    assert_eq!(
        stream.write(b"9", OpFlags::empty()).unwrap_err().kind(),
        ErrorKind::BufferTooSmall
    );
    stream.close().unwrap();
}
