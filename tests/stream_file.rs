use std::io::SeekFrom;

use sio::{ErrorKind, OpFlags, OptionValue, Stream, StreamFlags, StreamKind, StreamOption};

mod util;
use util::{assert_end_of_stream, init, temp_path};

const HELLO: &[u8] = b"Hello, SIO!";

#[test]
fn write_then_read_back() {
    init();
    let path = temp_path("t.bin");

    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
        0o644,
    )
    .unwrap();
    assert_eq!(file.kind(), StreamKind::File);
    assert_eq!(file.write(HELLO, OpFlags::DOALL).unwrap(), HELLO.len());
    file.close().unwrap();

    let mut file = Stream::open_file(&path, StreamFlags::READ, 0).unwrap();
    let mut buf = [0u8; 128];
    let n = file.read(&mut buf, OpFlags::empty()).unwrap();
    assert_eq!(n, HELLO.len());
    assert_eq!(&buf[..n], HELLO);

    assert_end_of_stream(file.read(&mut buf, OpFlags::empty()));
    assert!(file.eof());
    file.close().unwrap();

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn close_is_guarded() {
    init();
    let path = temp_path("close.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::WRITE | StreamFlags::CREATE,
        0o644,
    )
    .unwrap();

    file.close().unwrap();
    assert_eq!(file.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);
    assert_eq!(
        file.write(b"x", OpFlags::empty()).unwrap_err().kind(),
        ErrorKind::AlreadyClosed
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn zero_length_transfers() {
    init();
    let path = temp_path("zero.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE,
        0o644,
    )
    .unwrap();

    assert_eq!(file.read(&mut [], OpFlags::empty()).unwrap(), 0);
    assert_eq!(file.write(&[], OpFlags::empty()).unwrap(), 0);

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn seek_tell_truncate() {
    init();
    let path = temp_path("seek.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
        0o644,
    )
    .unwrap();
    file.write(b"0123456789", OpFlags::DOALL).unwrap();

    assert_eq!(file.seek(SeekFrom::Start(4)).unwrap(), 4);
    assert_eq!(file.tell().unwrap(), 4);
    assert_eq!(file.seek(SeekFrom::Current(2)).unwrap(), 6);
    assert_eq!(file.seek(SeekFrom::End(-1)).unwrap(), 9);
    assert_eq!(file.size().unwrap(), 10);

    // Truncating to the current size changes nothing.
    file.truncate(10).unwrap();
    assert_eq!(file.size().unwrap(), 10);

    file.truncate(4).unwrap();
    assert_eq!(file.size().unwrap(), 4);

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(file.read(&mut buf, OpFlags::empty()).unwrap(), 4);
    assert_eq!(&buf[..4], b"0123");

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn positioned_io() {
    init();
    let path = temp_path("pio.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
        0o644,
    )
    .unwrap();
    file.write(b"aaaaaaaaaa", OpFlags::DOALL).unwrap();

    assert_eq!(file.write_at(b"bb", 4).unwrap(), 2);
    // The cursor stays where sequential writes left it.
    assert_eq!(file.tell().unwrap(), 10);

    let mut buf = [0u8; 4];
    assert_eq!(file.read_at(&mut buf, 3).unwrap(), 4);
    assert_eq!(&buf, b"abba");

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn append_mode() {
    init();
    let path = temp_path("append.bin");
    std::fs::write(&path, b"start-").unwrap();

    let mut file = Stream::open_file(
        &path,
        StreamFlags::WRITE | StreamFlags::APPEND,
        0,
    )
    .unwrap();
    file.write(b"end", OpFlags::DOALL).unwrap();
    file.close().unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"start-end");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn exclusive_create() {
    init();
    let path = temp_path("excl.bin");
    let flags = StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::EXCL;

    let mut first = Stream::open_file(&path, flags, 0o644).unwrap();
    first.close().unwrap();

    assert_eq!(
        Stream::open_file(&path, flags, 0o644).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert_eq!(
        Stream::open_file(&temp_path("missing.bin"), StreamFlags::READ, 0)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn options_surface() {
    init();
    let path = temp_path("opts.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
        0o644,
    )
    .unwrap();
    file.write(b"xyz", OpFlags::DOALL).unwrap();

    assert_eq!(
        file.get_option(StreamOption::Type).unwrap(),
        OptionValue::Kind(StreamKind::File)
    );
    assert_eq!(
        file.get_option(StreamOption::Readable).unwrap(),
        OptionValue::Bool(true)
    );
    assert_eq!(
        file.get_option(StreamOption::Seekable).unwrap(),
        OptionValue::Bool(true)
    );
    assert_eq!(
        file.get_option(StreamOption::Position).unwrap(),
        OptionValue::UInt(3)
    );
    assert_eq!(
        file.get_option(StreamOption::Size).unwrap(),
        OptionValue::UInt(3)
    );
    assert_eq!(
        file.get_option(StreamOption::Blocking).unwrap(),
        OptionValue::Bool(true)
    );
    #[cfg(unix)]
    assert_eq!(
        file.get_option(StreamOption::CloseOnExec).unwrap(),
        OptionValue::Bool(true)
    );
    assert!(matches!(
        file.get_option(StreamOption::Handle).unwrap(),
        OptionValue::Handle(_)
    ));
    // Socket options make no sense on a file.
    assert_eq!(
        file.get_option(StreamOption::NoDelay).unwrap_err().kind(),
        ErrorKind::Unsupported
    );

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn record_locks() {
    init();
    let path = temp_path("lock.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
        0o644,
    )
    .unwrap();
    file.write(b"locked region", OpFlags::DOALL).unwrap();

    // Lock the whole file, then release it again.
    file.lock(0, 0, true, true).unwrap();
    file.unlock(0, 0).unwrap();

    // Locking is a file-only operation.
    let mut buffer = Stream::open_buffer(
        sio::Buffer::new().unwrap(),
        StreamFlags::READ | StreamFlags::WRITE,
    )
    .unwrap();
    assert_eq!(
        buffer.lock(0, 0, true, true).unwrap_err().kind(),
        ErrorKind::Unsupported
    );

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn unsupported_slots_report_unsupported() {
    init();
    let path = temp_path("slots.bin");
    let mut file = Stream::open_file(
        &path,
        StreamFlags::WRITE | StreamFlags::CREATE,
        0o644,
    )
    .unwrap();

    // Reading a write-only stream is a permission error, not a crash.
    let mut buf = [0u8; 4];
    assert_eq!(
        file.read(&mut buf, OpFlags::empty()).unwrap_err().kind(),
        ErrorKind::PermissionDenied
    );

    file.close().unwrap();
    std::fs::remove_file(&path).unwrap();
}
