use crate::stream::{file::FileStream, Backend, Stream, StreamFlags, StreamKind};
use crate::sys;
use crate::Result;

/// Creates an anonymous pipe pair. The halves are file-like streams of kind
/// [`StreamKind::Pipe`]: byte-oriented, unseekable, closed independently.
pub(crate) fn pipe(flags: StreamFlags) -> Result<(Stream, Stream)> {
    let nonblocking = flags.contains(StreamFlags::NONBLOCK);
    let (read_end, write_end) = sys::pipe::pipe(nonblocking)?;

    let read_flags = flags.difference(StreamFlags::WRITE) | StreamFlags::READ;
    let write_flags = flags.difference(StreamFlags::READ) | StreamFlags::WRITE;

    let read = Stream::new(
        StreamKind::Pipe,
        Backend::File(FileStream::from_native(read_end, read_flags, true)),
    );
    let write = Stream::new(
        StreamKind::Pipe,
        Backend::File(FileStream::from_native(write_end, write_flags, true)),
    );
    Ok((read, write))
}
