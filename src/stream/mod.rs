//! The polymorphic stream substrate.
//!
//! A [`Stream`] is a kind-tagged handle over one of the per-kind backends
//! (file, socket, pipe, timer, signal, terminal, in-memory). The uniform
//! operations (read, write, vectored I/O, seek, truncate, options) are
//! dispatched to the backend that created the handle; operations a backend
//! does not implement report [`ErrorKind::Unsupported`].
//!
//! Streams are synchronous. With [`StreamFlags::NONBLOCK`] (or the per-call
//! [`OpFlags::DONT_WAIT`]) operations that cannot proceed return
//! [`ErrorKind::WouldBlock`] instead of blocking. The per-call
//! [`OpFlags::DOALL`] asks the core to loop until the full buffer has been
//! transferred; see [`Stream::read`] and [`Stream::write`] for the exact
//! partial-progress rules.
//!
//! A stream is not internally synchronized: share distinct streams between
//! threads freely, but a single stream needs external locking.

use std::fmt;
use std::io::{self, IoSlice, IoSliceMut, SeekFrom};
use std::path::Path;

use bitflags::bitflags;

use crate::{Addr, Buffer, Error, ErrorKind, Result};

pub(crate) mod file;
pub(crate) mod memory;
pub(crate) mod pipe;
pub(crate) mod signal;
pub(crate) mod socket;
pub(crate) mod timer;

pub use self::signal::SignalInfo;

/// A native OS handle as adopted by [`Stream::from_handle`].
#[cfg(unix)]
pub type RawHandle = std::os::unix::io::RawFd;
/// A native OS handle as adopted by [`Stream::from_handle`].
///
/// Socket kinds interpret the value as a `SOCKET`.
#[cfg(windows)]
pub type RawHandle = std::os::windows::io::RawHandle;

/// The backend kind a stream was created with.
///
/// The tag and the backend are fixed for the stream's whole life. Kinds
/// without a backend in this crate ([`StreamKind::MessageQueue`],
/// [`StreamKind::SharedMemory`], [`StreamKind::Custom`]) exist for
/// completeness of the taxonomy and are rejected by
/// [`Stream::from_handle`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StreamKind {
    /// Regular file.
    File,
    /// Connected, listening or accepted TCP socket.
    TcpSocket,
    /// UDP socket; unbound clients become pseudo-sockets with a remembered
    /// peer.
    UdpSocket,
    /// Unix-domain socket.
    UnixSocket,
    /// One end of an anonymous pipe.
    Pipe,
    /// Terminal device.
    Terminal,
    /// Expiration-counting timer.
    Timer,
    /// Signal source.
    Signal,
    /// POSIX message queue (no backend in this crate).
    MessageQueue,
    /// Named shared memory (no backend in this crate).
    SharedMemory,
    /// Growable in-memory buffer.
    Buffer,
    /// Fixed caller-provided memory span.
    Memory,
    /// Reserved for embedders (no backend in this crate).
    Custom,
}

bitflags! {
    /// Per-stream mode flags, fixed at open except where an option allows
    /// changing them (blocking mode, close-on-exec).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StreamFlags: u32 {
        /// Open for reading.
        const READ = 1 << 0;
        /// Open for writing.
        const WRITE = 1 << 1;
        /// Create the file if it does not exist.
        const CREATE = 1 << 2;
        /// With [`StreamFlags::CREATE`], fail if the file exists.
        const EXCL = 1 << 3;
        /// Truncate an existing file.
        const TRUNC = 1 << 4;
        /// Every write appends.
        const APPEND = 1 << 5;
        /// Non-blocking mode.
        const NONBLOCK = 1 << 6;
        /// Overlapped/asynchronous handle (Windows files only).
        const ASYNC = 1 << 7;
        /// Bypass userspace buffering.
        const UNBUFFERED = 1 << 8;
        /// Write-through to storage.
        const SYNC = 1 << 9;
        /// Temporary file hint.
        const TEMP = 1 << 10;
        /// Binary mode hint (no effect on any current platform).
        const BINARY = 1 << 11;
        /// Memory-map the object where applicable.
        const MMAP = 1 << 12;
        /// Direct I/O, bypassing the page cache.
        const DIRECT = 1 << 13;
        /// Socket: bind (and for stream types, listen) instead of
        /// connecting.
        const SERVER = 1 << 14;
        /// Socket: stream (TCP) rather than datagram semantics.
        const TCP = 1 << 15;
    }
}

bitflags! {
    /// Per-call operation flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct OpFlags: u32 {
        /// Loop until the full buffer is transferred or an error occurs.
        const DOALL = 1 << 0;
        /// With [`OpFlags::DOALL`], accept partial progress: return after
        /// the first syscall.
        const DOALL_NONBLOCK = 1 << 1;

        /// Socket: probe-only datagram delivery (`MSG_CONFIRM`).
        const CONFIRM = 1 << 8;
        /// Socket: bypass routing (`MSG_DONTROUTE`).
        const DONT_ROUTE = 1 << 9;
        /// Do not block for this call (`MSG_DONTWAIT` and equivalents).
        const DONT_WAIT = 1 << 10;
        /// Socket: terminate a record (`MSG_EOR`).
        const END_OF_RECORD = 1 << 11;
        /// Socket: more data to follow (`MSG_MORE`).
        const MORE = 1 << 12;
        /// Socket: suppress `SIGPIPE` (`MSG_NOSIGNAL`).
        const NO_SIGNAL = 1 << 13;
        /// Socket: out-of-band data (`MSG_OOB`).
        const OOB = 1 << 14;
        /// Socket: TCP fast open (`MSG_FASTOPEN`).
        const FAST_OPEN = 1 << 15;
    }
}

/// A stream property queried with [`Stream::get_option`] or changed with
/// [`Stream::set_option`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum StreamOption {
    /// The stream kind ([`OptionValue::Kind`], read-only).
    Type,
    /// The stream flags ([`OptionValue::Flags`], read-only).
    Flags,
    /// Current position ([`OptionValue::UInt`], read-only; seekable kinds).
    Position,
    /// Object size ([`OptionValue::UInt`], read-only; sized kinds).
    Size,
    /// Whether the stream was opened readable ([`OptionValue::Bool`],
    /// read-only).
    Readable,
    /// Whether the stream was opened writable ([`OptionValue::Bool`],
    /// read-only).
    Writable,
    /// Whether the kind supports seeking ([`OptionValue::Bool`],
    /// read-only).
    Seekable,
    /// End-of-stream indicator ([`OptionValue::Bool`], read-only).
    Eof,
    /// The native handle ([`OptionValue::Handle`], read-only).
    Handle,
    /// Blocking mode ([`OptionValue::Bool`]).
    Blocking,
    /// Close-on-exec flag ([`OptionValue::Bool`]; Unix only).
    CloseOnExec,
    /// Append mode ([`OptionValue::Bool`], read-only).
    Append,
    /// Synchronous write-through mode ([`OptionValue::Bool`], read-only).
    Sync,
    /// Direct I/O mode ([`OptionValue::Bool`], read-only).
    Direct,
    /// `TCP_NODELAY` ([`OptionValue::Bool`]).
    NoDelay,
    /// `SO_KEEPALIVE` ([`OptionValue::Bool`]).
    KeepAlive,
    /// `SO_REUSEADDR` ([`OptionValue::Bool`]).
    ReuseAddr,
    /// `SO_BROADCAST` ([`OptionValue::Bool`]).
    Broadcast,
    /// `SO_RCVBUF` in bytes ([`OptionValue::UInt`]).
    RecvBuffer,
    /// `SO_SNDBUF` in bytes ([`OptionValue::UInt`]).
    SendBuffer,
    /// Timer interval in milliseconds ([`OptionValue::UInt`]).
    TimerInterval,
    /// Whether the timer is one-shot ([`OptionValue::Bool`]).
    TimerOneshot,
    /// Capacity of a buffer stream in bytes ([`OptionValue::UInt`]).
    BufferSize,
}

/// A typed option value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionValue {
    /// A boolean property.
    Bool(bool),
    /// An unsigned numeric property.
    UInt(u64),
    /// A stream kind.
    Kind(StreamKind),
    /// A stream flag word.
    Flags(StreamFlags),
    /// A native handle.
    Handle(RawHandle),
}

impl OptionValue {
    /// Extracts a boolean, failing with [`ErrorKind::InvalidParam`]
    /// otherwise.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            OptionValue::Bool(b) => Ok(*b),
            _ => Err(Error::new(ErrorKind::InvalidParam)),
        }
    }

    /// Extracts an unsigned integer, failing with
    /// [`ErrorKind::InvalidParam`] otherwise.
    pub fn as_uint(&self) -> Result<u64> {
        match self {
            OptionValue::UInt(v) => Ok(*v),
            _ => Err(Error::new(ErrorKind::InvalidParam)),
        }
    }
}

/// The capability set every backend implements.
///
/// Optional operations default to [`ErrorKind::Unsupported`], the moral
/// equivalent of an empty slot in a C operations table. The core treats an
/// `Unsupported` vectored transfer as "absent" and falls back to serial
/// reads/writes; every other operation propagates it.
pub(crate) trait RawStream {
    fn flags(&self) -> StreamFlags;

    fn close(&mut self) -> Result<()>;

    fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize>;

    fn write(&mut self, buf: &[u8], flags: OpFlags) -> Result<usize>;

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>], flags: OpFlags) -> Result<usize> {
        let _ = (bufs, flags);
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>], flags: OpFlags) -> Result<usize> {
        let _ = (bufs, flags);
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn flush(&mut self) -> Result<()> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let _ = pos;
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        let _ = size;
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn size(&self) -> Result<u64> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let _ = option;
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        let _ = (option, value);
        Err(Error::new(ErrorKind::Unsupported))
    }
}

enum Backend {
    File(file::FileStream),
    Socket(socket::SocketStream),
    Timer(timer::TimerStream),
    Signal(signal::SignalStream),
    Buffer(memory::BufferStream),
    Memory(memory::RawMemoryStream),
}

/// A uniform handle over one OS I/O object.
///
/// See the [module documentation](self) for the dispatch and blocking
/// model. Dropping an unclosed stream performs a best-effort close; call
/// [`Stream::close`] to observe close errors.
pub struct Stream {
    kind: StreamKind,
    backend: Backend,
}

impl Stream {
    pub(crate) fn new(kind: StreamKind, backend: Backend) -> Stream {
        Stream { kind, backend }
    }

    fn raw(&self) -> &dyn RawStream {
        match &self.backend {
            Backend::File(s) => s,
            Backend::Socket(s) => s,
            Backend::Timer(s) => s,
            Backend::Signal(s) => s,
            Backend::Buffer(s) => s,
            Backend::Memory(s) => s,
        }
    }

    fn raw_mut(&mut self) -> &mut dyn RawStream {
        match &mut self.backend {
            Backend::File(s) => s,
            Backend::Socket(s) => s,
            Backend::Timer(s) => s,
            Backend::Signal(s) => s,
            Backend::Buffer(s) => s,
            Backend::Memory(s) => s,
        }
    }

    /// The kind tag this stream was created with.
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// The stream's mode flags.
    pub fn flags(&self) -> StreamFlags {
        self.raw().flags()
    }

    /// Opens a file stream.
    ///
    /// The portable flags translate to the native open call; see
    /// [`StreamFlags`]. `mode` is the Unix permission word for newly created
    /// files (ignored on Windows and when nothing is created).
    pub fn open_file(path: &Path, flags: StreamFlags, mode: u32) -> Result<Stream> {
        let backend = file::FileStream::open(path, flags, mode)?;
        Ok(Stream::new(StreamKind::File, Backend::File(backend)))
    }

    /// Opens a terminal stream over `device`, defaulting to the controlling
    /// terminal.
    pub fn open_terminal(device: Option<&Path>, flags: StreamFlags) -> Result<Stream> {
        let backend = file::FileStream::open_terminal(device, flags)?;
        Ok(Stream::new(StreamKind::Terminal, Backend::File(backend)))
    }

    /// Opens a socket stream for `addr`.
    ///
    /// [`StreamFlags::TCP`] selects stream semantics, otherwise datagram.
    /// With [`StreamFlags::SERVER`] the socket is bound (and, for stream
    /// types, listening); otherwise stream sockets connect and datagram
    /// sockets become pseudo-sockets that remember `addr` as their default
    /// peer. A non-blocking connect still in progress reports success;
    /// completion is detected by the caller (e.g. via
    /// [`Stream::take_error`]).
    pub fn open_socket(addr: &Addr, flags: StreamFlags) -> Result<Stream> {
        let (kind, backend) = socket::SocketStream::open(addr, flags)?;
        Ok(Stream::new(kind, Backend::Socket(backend)))
    }

    /// Accepts a connection on a listening socket stream, returning the
    /// client stream and its address.
    ///
    /// The client inherits the server's blocking mode and close-on-exec.
    pub fn accept(&mut self) -> Result<(Stream, Addr)> {
        match &mut self.backend {
            Backend::Socket(server) => {
                let kind = self.kind;
                let (client, addr) = server.accept()?;
                Ok((Stream::new(kind, Backend::Socket(client)), addr))
            }
            _ => Err(Error::new(ErrorKind::NotASocket)),
        }
    }

    /// Creates an anonymous pipe, returning `(read, write)` streams.
    pub fn pipe(flags: StreamFlags) -> Result<(Stream, Stream)> {
        pipe::pipe(flags)
    }

    /// Opens a timer stream firing after `interval_ms` milliseconds and,
    /// unless `oneshot`, every `interval_ms` thereafter.
    ///
    /// Reads yield the expiration count as 8 native-order bytes; writes
    /// re-arm the timer. Only Linux, Android and Windows have a timer
    /// backend; elsewhere this fails with [`ErrorKind::Unsupported`].
    pub fn open_timer(interval_ms: u64, oneshot: bool, flags: StreamFlags) -> Result<Stream> {
        let backend = timer::TimerStream::open(interval_ms, oneshot, flags)?;
        Ok(Stream::new(StreamKind::Timer, Backend::Timer(backend)))
    }

    /// Opens a signal stream receiving the given signal numbers.
    ///
    /// The signals are blocked for normal delivery while the stream is open.
    /// Reads yield a signal payload; writes send a signal. See the `signal`
    /// module notes for the platform differences.
    pub fn open_signal(signals: &[i32], flags: StreamFlags) -> Result<Stream> {
        let backend = signal::SignalStream::open(signals, flags)?;
        Ok(Stream::new(StreamKind::Signal, Backend::Signal(backend)))
    }

    /// Wraps a [`Buffer`] as a seekable stream. The buffer is owned by the
    /// stream and released on close.
    pub fn open_buffer(buffer: Buffer, flags: StreamFlags) -> Result<Stream> {
        let backend = memory::BufferStream::new(buffer, flags);
        Ok(Stream::new(StreamKind::Buffer, Backend::Buffer(backend)))
    }

    /// Wraps a fixed caller-provided memory span as a stream.
    ///
    /// The span cannot grow or be truncated; the caller retains ownership
    /// and the memory is merely forgotten on close.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for the
    /// lifetime of the stream and must not be aliased while the stream is
    /// alive.
    pub unsafe fn open_memory(ptr: *mut u8, len: usize, flags: StreamFlags) -> Result<Stream> {
        let backend = memory::RawMemoryStream::new(ptr, len, flags);
        Ok(Stream::new(StreamKind::Memory, Backend::Memory(backend)))
    }

    /// Adopts an existing native handle as a stream of the given kind.
    ///
    /// Ownership transfers to the stream: it will close the handle.
    ///
    /// # Safety
    ///
    /// `handle` must be a valid, open handle of a type matching `kind`, and
    /// must not be closed or used owned elsewhere afterwards.
    pub unsafe fn from_handle(
        kind: StreamKind,
        handle: RawHandle,
        flags: StreamFlags,
    ) -> Result<Stream> {
        let backend = match kind {
            StreamKind::File | StreamKind::Pipe | StreamKind::Terminal => {
                Backend::File(file::FileStream::from_handle(handle, flags, true))
            }
            StreamKind::TcpSocket | StreamKind::UdpSocket | StreamKind::UnixSocket => {
                Backend::Socket(socket::SocketStream::from_handle(handle, flags))
            }
            StreamKind::Timer => Backend::Timer(timer::TimerStream::from_handle(handle, flags)?),
            StreamKind::Signal => {
                Backend::Signal(signal::SignalStream::from_handle(handle, flags)?)
            }
            _ => return Err(Error::new(ErrorKind::Unsupported)),
        };
        Ok(Stream::new(kind, backend))
    }

    /// A non-owning stream over standard input. Closing it does not close
    /// the underlying handle.
    pub fn stdin() -> Stream {
        file::stdio(file::StdioHandle::Stdin)
    }

    /// A non-owning stream over standard output.
    pub fn stdout() -> Stream {
        file::stdio(file::StdioHandle::Stdout)
    }

    /// A non-owning stream over standard error.
    pub fn stderr() -> Stream {
        file::stdio(file::StdioHandle::Stderr)
    }

    /// Closes the stream, releasing its OS resources.
    ///
    /// The native handle is invalidated on the first successful close; any
    /// later call fails with [`ErrorKind::AlreadyClosed`].
    pub fn close(&mut self) -> Result<()> {
        self.raw_mut().close()
    }

    /// Reads into `buf`, returning the number of bytes transferred.
    ///
    /// A zero-length `buf` reports `Ok(0)` without touching the backend.
    /// Without [`OpFlags::DOALL`] this is a single backend call. With it,
    /// the core loops until `buf` is full, an error occurs, or (with
    /// [`OpFlags::DOALL_NONBLOCK`]) the first syscall returns. End of
    /// stream or would-block after partial progress reports the short count
    /// as success; with no progress the error is propagated.
    pub fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !flags.contains(OpFlags::DOALL) {
            return self.raw_mut().read(buf, flags);
        }

        let inner = flags.difference(OpFlags::DOALL | OpFlags::DOALL_NONBLOCK);
        let mut total = 0;
        while total < buf.len() {
            match self.raw_mut().read(&mut buf[total..], inner) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    if flags.contains(OpFlags::DOALL_NONBLOCK) {
                        break;
                    }
                }
                Err(err) => match err.kind() {
                    ErrorKind::EndOfStream | ErrorKind::WouldBlock if total > 0 => break,
                    _ => return Err(err),
                },
            }
        }
        Ok(total)
    }

    /// Writes `buf`, returning the number of bytes transferred.
    ///
    /// A zero-length `buf` reports `Ok(0)`. With [`OpFlags::DOALL`] the
    /// core loops until everything is written: would-block after partial
    /// progress reports the short count as success, any other failure to
    /// complete after progress is an I/O error, and zero-progress failures
    /// propagate the underlying error.
    pub fn write(&mut self, buf: &[u8], flags: OpFlags) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !flags.contains(OpFlags::DOALL) {
            return self.raw_mut().write(buf, flags);
        }

        let inner = flags.difference(OpFlags::DOALL | OpFlags::DOALL_NONBLOCK);
        let mut total = 0;
        while total < buf.len() {
            match self.raw_mut().write(&buf[total..], inner) {
                Ok(0) => {
                    return if total > 0 {
                        Ok(total)
                    } else {
                        Err(Error::new(ErrorKind::Io))
                    };
                }
                Ok(n) => {
                    total += n;
                    if flags.contains(OpFlags::DOALL_NONBLOCK) {
                        break;
                    }
                }
                Err(err) => match err.kind() {
                    ErrorKind::WouldBlock if total > 0 => break,
                    _ if total > 0 => return Err(Error::new(ErrorKind::Io)),
                    _ => return Err(err),
                },
            }
        }
        Ok(total)
    }

    /// Scatter-read into `bufs`.
    ///
    /// Backends without native vectored I/O are driven by a serial loop of
    /// single reads, stopping at the first short read or end of stream.
    pub fn read_vectored(
        &mut self,
        bufs: &mut [IoSliceMut<'_>],
        flags: OpFlags,
    ) -> Result<usize> {
        match self.raw_mut().read_vectored(bufs, flags) {
            Err(err) if err.kind() == ErrorKind::Unsupported => {}
            result => return result,
        }

        let mut total = 0;
        for buf in bufs.iter_mut() {
            if buf.is_empty() {
                continue;
            }
            match self.read(buf, flags) {
                Ok(n) => {
                    total += n;
                    if n < buf.len() {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::EndOfStream && total > 0 => break,
                Err(err) => return Err(err),
            }
        }
        Ok(total)
    }

    /// Gather-write from `bufs`, with the same fallback rule as
    /// [`Stream::read_vectored`].
    pub fn write_vectored(&mut self, bufs: &[IoSlice<'_>], flags: OpFlags) -> Result<usize> {
        match self.raw_mut().write_vectored(bufs, flags) {
            Err(err) if err.kind() == ErrorKind::Unsupported => {}
            result => return result,
        }

        let mut total = 0;
        for buf in bufs.iter() {
            if buf.is_empty() {
                continue;
            }
            let n = self.write(buf, flags)?;
            total += n;
            if n < buf.len() {
                break;
            }
        }
        Ok(total)
    }

    /// Flushes buffered data to the underlying object.
    pub fn flush(&mut self) -> Result<()> {
        self.raw_mut().flush()
    }

    /// Repositions the stream, returning the new position from the start.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.raw_mut().seek(pos)
    }

    /// The current position; a zero-displacement seek from the current
    /// position.
    pub fn tell(&mut self) -> Result<u64> {
        self.raw_mut().seek(SeekFrom::Current(0))
    }

    /// Truncates (or zero-extends) the object to `size` bytes.
    pub fn truncate(&mut self, size: u64) -> Result<()> {
        self.raw_mut().truncate(size)
    }

    /// The object's size in bytes.
    pub fn size(&self) -> Result<u64> {
        self.raw().size()
    }

    /// Queries a stream property.
    pub fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        match option {
            StreamOption::Type => Ok(OptionValue::Kind(self.kind)),
            StreamOption::Flags => Ok(OptionValue::Flags(self.flags())),
            StreamOption::Readable => Ok(OptionValue::Bool(
                self.flags().contains(StreamFlags::READ),
            )),
            StreamOption::Writable => Ok(OptionValue::Bool(
                self.flags().contains(StreamFlags::WRITE),
            )),
            StreamOption::Seekable => Ok(OptionValue::Bool(matches!(
                self.kind,
                StreamKind::File | StreamKind::Buffer | StreamKind::Memory
            ))),
            _ => self.raw().get_option(option),
        }
    }

    /// Changes a stream property.
    pub fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        self.raw_mut().set_option(option, value)
    }

    /// True once the stream has reached its end.
    ///
    /// Kinds without an end notion (sockets before the peer closes, timers,
    /// signals) report `false`.
    pub fn eof(&self) -> bool {
        match self.get_option(StreamOption::Eof) {
            Ok(OptionValue::Bool(eof)) => eof,
            _ => false,
        }
    }

    /// Fetches and clears the pending asynchronous error on a socket
    /// stream, as left behind by a non-blocking connect.
    pub fn take_error(&self) -> Result<Option<Error>> {
        match &self.backend {
            Backend::Socket(socket) => socket.take_error(),
            _ => Err(Error::new(ErrorKind::NotASocket)),
        }
    }

    /// Locks a byte range of a file stream. `len == 0` locks to end of
    /// file; with `wait` unset a held lock fails immediately.
    pub fn lock(&mut self, offset: u64, len: u64, exclusive: bool, wait: bool) -> Result<()> {
        match &mut self.backend {
            Backend::File(file) => file.lock(offset, len, exclusive, wait),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    /// Releases a byte-range lock taken with [`Stream::lock`].
    pub fn unlock(&mut self, offset: u64, len: u64) -> Result<()> {
        match &mut self.backend {
            Backend::File(file) => file.unlock(offset, len),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    /// Positioned read on a file stream; the cursor is not moved.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        match &mut self.backend {
            Backend::File(file) => file.read_at(buf, offset),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    /// Positioned write on a file stream; the cursor is not moved.
    pub fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        match &mut self.backend {
            Backend::File(file) => file.write_at(buf, offset),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    /// Reads one signal payload from a signal stream.
    pub fn read_signal(&mut self, flags: OpFlags) -> Result<SignalInfo> {
        match &mut self.backend {
            Backend::Signal(signal) => signal.read_info(flags),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

impl io::Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Stream::read(self, buf, OpFlags::empty()) {
            Ok(n) => Ok(n),
            // `std::io` signals end of stream with a zero count.
            Err(err) if err.kind() == ErrorKind::EndOfStream => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        match Stream::read_vectored(self, bufs, OpFlags::empty()) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == ErrorKind::EndOfStream => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

impl io::Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Stream::write(self, buf, OpFlags::empty()).map_err(Into::into)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        Stream::write_vectored(self, bufs, OpFlags::empty()).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        match Stream::flush(self) {
            Ok(()) => Ok(()),
            // Kinds with nothing to flush are flushed by definition.
            Err(err) if err.kind() == ErrorKind::Unsupported => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("kind", &self.kind)
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}
