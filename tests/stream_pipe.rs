use sio::{OpFlags, Stream, StreamFlags, StreamKind};

mod util;
use util::{assert_end_of_stream, assert_would_block, init};

#[test]
fn pipe_round_trip() {
    init();
    let (mut read_end, mut write_end) = Stream::pipe(StreamFlags::empty()).unwrap();
    assert_eq!(read_end.kind(), StreamKind::Pipe);
    assert_eq!(write_end.kind(), StreamKind::Pipe);
    assert!(read_end.flags().contains(StreamFlags::READ));
    assert!(write_end.flags().contains(StreamFlags::WRITE));

    assert_eq!(write_end.write(b"through the pipe", OpFlags::DOALL).unwrap(), 16);

    let mut buf = [0u8; 16];
    assert_eq!(read_end.read(&mut buf, OpFlags::DOALL).unwrap(), 16);
    assert_eq!(&buf, b"through the pipe");

    // Pipes are not seekable. (The exact kind is the platform's: ESPIPE on
    // Unix, an invalid-function error on Windows.)
    assert!(read_end.seek(std::io::SeekFrom::Start(0)).is_err());

    // Closing the write half ends the stream for the reader.
    write_end.close().unwrap();
    assert_end_of_stream(read_end.read(&mut buf, OpFlags::empty()));
    read_end.close().unwrap();
}

#[cfg(unix)]
#[test]
fn nonblocking_pipe() {
    init();
    let (mut read_end, mut write_end) = Stream::pipe(StreamFlags::NONBLOCK).unwrap();

    let mut buf = [0u8; 8];
    assert_would_block(read_end.read(&mut buf, OpFlags::empty()));

    write_end.write(b"x", OpFlags::empty()).unwrap();
    assert_eq!(read_end.read(&mut buf, OpFlags::empty()).unwrap(), 1);

    read_end.close().unwrap();
    write_end.close().unwrap();
}
