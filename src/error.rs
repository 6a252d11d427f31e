//! The portable error taxonomy.
//!
//! Every fallible operation in this crate returns [`Result`], whose error
//! carries exactly one [`ErrorKind`]. Native error codes never escape: they
//! are translated once, at the syscall boundary, by
//! [`ErrorKind::from_raw_os_error`]. The translation is total; codes with
//! no better mapping become [`ErrorKind::Generic`].

use std::io;
use std::{error, fmt, result};

/// A specialized `Result` type for SIO operations.
pub type Result<T> = result::Result<T, Error>;

/// Failure categories reported by the API.
///
/// The set is closed per release but may grow; match with a wildcard arm.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Generic error with no better classification.
    Generic,
    /// An argument violated the operation's contract.
    InvalidParam,
    /// Memory allocation failed.
    OutOfMemory,
    /// Low-level I/O error.
    Io,
    /// End of file or stream.
    EndOfStream,
    /// Network error with no narrower classification.
    Network,
    /// The operation timed out.
    TimedOut,
    /// The resource is busy.
    Busy,
    /// Permission denied.
    PermissionDenied,
    /// The resource already exists.
    AlreadyExists,
    /// The resource was not found.
    NotFound,
    /// The destination buffer is too small.
    BufferTooSmall,
    /// Invalid path format.
    BadPath,
    /// The operation was interrupted.
    Interrupted,
    /// The operation would block.
    WouldBlock,
    /// Unclassified system error.
    System,
    /// The operation is not supported by this stream or platform.
    Unsupported,

    /// The file is a directory.
    IsDirectory,
    /// The path is not a directory.
    NotADirectory,
    /// The file or mapping is read-only.
    ReadOnly,
    /// The file is too large.
    FileTooLarge,
    /// No space left on device.
    NoSpace,
    /// The stream is already closed.
    AlreadyClosed,
    /// The file is locked by another holder.
    FileLocked,
    /// A seek failed or the object is not seekable.
    SeekFailed,
    /// The file name is too long.
    NameTooLong,
    /// Invalid file format.
    InvalidFormat,
    /// Too many levels of symbolic links.
    FilesystemLoop,

    /// The connection was refused.
    ConnectionRefused,
    /// The connection was aborted.
    ConnectionAborted,
    /// The connection was reset by the peer.
    ConnectionReset,
    /// The host is unreachable.
    HostUnreachable,
    /// The host is down.
    HostDown,
    /// The address is already in use.
    AddrInUse,
    /// The socket is not connected.
    NotConnected,
    /// The socket has been shut down.
    Shutdown,
    /// The message is too large for the transport.
    MessageTooLarge,
    /// The connection attempt timed out.
    ConnectionTimedOut,
    /// Protocol error.
    Protocol,
    /// The address is invalid for the requested operation.
    InvalidAddress,
    /// A destination address is required.
    AddressRequired,
    /// The operation is now in progress.
    InProgress,
    /// An operation is already in progress.
    Already,
    /// Socket operation attempted on a non-socket.
    NotASocket,
    /// The protocol option is not available.
    NoProtocolOption,

    /// A resource deadlock would occur.
    Deadlock,
    /// No such process.
    NoSuchProcess,
    /// Waiting on a child process failed.
    WaitFailed,
    /// Executing a process image failed.
    ExecFailed,

    /// A system limit was reached.
    SystemLimit,
    /// System resources are exhausted.
    SystemResources,
    /// Not implemented on this system.
    NotImplemented,
    /// A value is too large for the system representation.
    Overflow,
    /// Device error.
    DeviceError,
}

impl ErrorKind {
    /// Returns the stable diagnostic string for this kind.
    pub fn as_str(self) -> &'static str {
        use ErrorKind::*;
        match self {
            Generic => "generic error",
            InvalidParam => "invalid parameter",
            OutOfMemory => "memory allocation failure",
            Io => "I/O error",
            EndOfStream => "end of stream",
            Network => "network error",
            TimedOut => "operation timed out",
            Busy => "resource busy",
            PermissionDenied => "permission denied",
            AlreadyExists => "resource already exists",
            NotFound => "resource not found",
            BufferTooSmall => "destination buffer too small",
            BadPath => "invalid path format",
            Interrupted => "operation interrupted",
            WouldBlock => "operation would block",
            System => "system error",
            Unsupported => "unsupported operation",
            IsDirectory => "file is a directory",
            NotADirectory => "path is not a directory",
            ReadOnly => "file is read-only",
            FileTooLarge => "file too large",
            NoSpace => "no space left on device",
            AlreadyClosed => "stream is already closed",
            FileLocked => "file is locked",
            SeekFailed => "seek error",
            NameTooLong => "file name too long",
            InvalidFormat => "invalid file format",
            FilesystemLoop => "too many levels of symbolic links",
            ConnectionRefused => "connection refused",
            ConnectionAborted => "connection aborted",
            ConnectionReset => "connection reset",
            HostUnreachable => "host unreachable",
            HostDown => "host is down",
            AddrInUse => "address already in use",
            NotConnected => "socket not connected",
            Shutdown => "socket shutdown",
            MessageTooLarge => "message too large",
            ConnectionTimedOut => "connection timed out",
            Protocol => "protocol error",
            InvalidAddress => "invalid address",
            AddressRequired => "destination address required",
            InProgress => "operation now in progress",
            Already => "operation already in progress",
            NotASocket => "socket operation on non-socket",
            NoProtocolOption => "protocol option not available",
            Deadlock => "resource deadlock would occur",
            NoSuchProcess => "no such process",
            WaitFailed => "wait on child failed",
            ExecFailed => "exec failed",
            SystemLimit => "system limit reached",
            SystemResources => "system resources exhausted",
            NotImplemented => "not implemented on this system",
            Overflow => "value too large",
            DeviceError => "device error",
        }
    }

    /// Translates a native `errno` value.
    ///
    /// Total: unknown codes map to [`ErrorKind::Generic`].
    #[cfg(unix)]
    pub fn from_raw_os_error(code: i32) -> ErrorKind {
        use ErrorKind::*;

        // These pairs alias on some platforms, which a `match` cannot express
        // without unreachable-pattern warnings.
        if code == libc::EAGAIN || code == libc::EWOULDBLOCK {
            return WouldBlock;
        }
        if code == libc::ENOTSUP || code == libc::EOPNOTSUPP {
            return Unsupported;
        }

        match code {
            libc::EPERM | libc::EACCES => PermissionDenied,
            libc::ENOENT => NotFound,
            libc::ESRCH => NoSuchProcess,
            libc::EINTR => Interrupted,
            libc::EIO => Io,
            libc::ENXIO | libc::ENODEV => DeviceError,
            libc::E2BIG | libc::EBADF | libc::EFAULT | libc::EXDEV => InvalidParam,
            libc::ENOEXEC => ExecFailed,
            libc::ECHILD => WaitFailed,
            libc::ENOMEM => OutOfMemory,
            libc::EBUSY | libc::ETXTBSY => Busy,
            libc::EEXIST | libc::ENOTEMPTY => AlreadyExists,
            libc::ENOTDIR => NotADirectory,
            libc::EISDIR => IsDirectory,
            libc::EINVAL | libc::ENOTTY | libc::EDOM | libc::ERANGE => InvalidParam,
            libc::ENFILE | libc::EMFILE | libc::EMLINK => SystemLimit,
            libc::EFBIG => FileTooLarge,
            libc::ENOSPC => NoSpace,
            libc::ESPIPE => SeekFailed,
            libc::EROFS => ReadOnly,
            libc::EPIPE => Io,
            libc::EDEADLK => Deadlock,
            libc::ENAMETOOLONG => NameTooLong,
            libc::ELOOP => FilesystemLoop,
            libc::EOVERFLOW => Overflow,
            libc::ENOSYS => NotImplemented,
            libc::ETIMEDOUT => TimedOut,
            libc::ECANCELED => Interrupted,
            libc::EOWNERDEAD | libc::ENOTRECOVERABLE => System,
            libc::EBADMSG | libc::EPROTO => Protocol,
            libc::EADDRNOTAVAIL => InvalidAddress,
            libc::EADDRINUSE => AddrInUse,
            libc::ECONNREFUSED => ConnectionRefused,
            libc::ECONNRESET => ConnectionReset,
            libc::ECONNABORTED => ConnectionAborted,
            libc::EISCONN | libc::ENETDOWN | libc::ENETRESET | libc::ENETUNREACH => Network,
            libc::ENOTCONN => NotConnected,
            libc::EHOSTUNREACH => HostUnreachable,
            libc::EHOSTDOWN => HostDown,
            libc::EMSGSIZE => MessageTooLarge,
            libc::ENOPROTOOPT => NoProtocolOption,
            libc::EDESTADDRREQ => AddressRequired,
            libc::EALREADY => Already,
            libc::EINPROGRESS => InProgress,
            libc::ENOTSOCK => NotASocket,
            libc::ENOBUFS => SystemResources,
            libc::EAFNOSUPPORT | libc::EPROTONOSUPPORT | libc::EPROTOTYPE => Protocol,
            _ => Generic,
        }
    }

    /// Translates a native `GetLastError` / `WSAGetLastError` value.
    ///
    /// Total: unknown codes map to [`ErrorKind::Generic`].
    #[cfg(windows)]
    pub fn from_raw_os_error(code: u32) -> ErrorKind {
        use windows_sys::Win32::Foundation as wf;
        use ErrorKind::*;

        match code {
            wf::ERROR_INVALID_FUNCTION | wf::ERROR_NOT_SUPPORTED => Unsupported,
            wf::ERROR_FILE_NOT_FOUND | wf::ERROR_PATH_NOT_FOUND => NotFound,
            wf::ERROR_TOO_MANY_OPEN_FILES => SystemLimit,
            wf::ERROR_ACCESS_DENIED | wf::ERROR_NOACCESS | wf::ERROR_CANNOT_MAKE => {
                PermissionDenied
            }
            wf::ERROR_CURRENT_DIRECTORY => PermissionDenied,
            wf::ERROR_INVALID_HANDLE
            | wf::ERROR_INVALID_DRIVE
            | wf::ERROR_NOT_SAME_DEVICE
            | wf::ERROR_WRONG_DISK
            | wf::ERROR_INVALID_PARAMETER
            | wf::ERROR_INVALID_ADDRESS => InvalidParam,
            wf::ERROR_NOT_ENOUGH_MEMORY | wf::ERROR_OUTOFMEMORY => OutOfMemory,
            wf::ERROR_NO_MORE_FILES | wf::ERROR_HANDLE_EOF => EndOfStream,
            wf::ERROR_WRITE_PROTECT => ReadOnly,
            wf::ERROR_BAD_UNIT | wf::ERROR_NOT_READY => DeviceError,
            wf::ERROR_CRC
            | wf::ERROR_BAD_LENGTH
            | wf::ERROR_SEEK
            | wf::ERROR_NOT_DOS_DISK
            | wf::ERROR_SECTOR_NOT_FOUND
            | wf::ERROR_GEN_FAILURE => Io,
            wf::ERROR_SHARING_VIOLATION | wf::ERROR_LOCK_VIOLATION => FileLocked,
            wf::ERROR_HANDLE_DISK_FULL | wf::ERROR_DISK_FULL => NoSpace,
            wf::ERROR_REM_NOT_LIST
            | wf::ERROR_BAD_NETPATH
            | wf::ERROR_NETWORK_BUSY
            | wf::ERROR_DEV_NOT_EXIST
            | wf::ERROR_BAD_NET_RESP
            | wf::ERROR_UNEXP_NET_ERR
            | wf::ERROR_BAD_NET_NAME
            | wf::ERROR_NET_WRITE_FAULT => Network,
            wf::ERROR_DUP_NAME | wf::ERROR_FILE_EXISTS | wf::ERROR_ALREADY_EXISTS => AlreadyExists,
            wf::ERROR_IO_PENDING => WouldBlock,
            wf::ERROR_TIMEOUT => TimedOut,
            wf::ERROR_BUSY | wf::ERROR_PATH_BUSY => Busy,
            wf::ERROR_NOT_ENOUGH_QUOTA => SystemResources,
            wf::ERROR_DIRECTORY => IsDirectory,
            wf::ERROR_OPERATION_ABORTED => Interrupted,
            wf::ERROR_BUFFER_OVERFLOW => BufferTooSmall,
            wf::ERROR_BAD_PATHNAME => BadPath,
            _ => winsock_kind(code as i32),
        }
    }
}

#[cfg(windows)]
fn winsock_kind(code: i32) -> ErrorKind {
    use windows_sys::Win32::Networking::WinSock as ws;
    use ErrorKind::*;

    match code {
        ws::WSAEACCES => PermissionDenied,
        ws::WSAEADDRINUSE => AddrInUse,
        ws::WSAEADDRNOTAVAIL => InvalidAddress,
        ws::WSAEAFNOSUPPORT => Network,
        ws::WSAEALREADY => Already,
        ws::WSAECONNABORTED => ConnectionAborted,
        ws::WSAECONNREFUSED => ConnectionRefused,
        ws::WSAECONNRESET => ConnectionReset,
        ws::WSAEDESTADDRREQ => AddressRequired,
        ws::WSAEHOSTDOWN => HostDown,
        ws::WSAEHOSTUNREACH => HostUnreachable,
        ws::WSAEINPROGRESS => InProgress,
        ws::WSAEINTR => Interrupted,
        ws::WSAEINVAL => InvalidParam,
        ws::WSAEISCONN => Network,
        ws::WSAEMSGSIZE => MessageTooLarge,
        ws::WSAENETDOWN | ws::WSAENETRESET | ws::WSAENETUNREACH => Network,
        ws::WSAENOBUFS => SystemResources,
        ws::WSAENOPROTOOPT => NoProtocolOption,
        ws::WSAENOTCONN => NotConnected,
        ws::WSAENOTSOCK => NotASocket,
        ws::WSAEOPNOTSUPP => Unsupported,
        ws::WSAEPROTONOSUPPORT | ws::WSAEPROTOTYPE => Protocol,
        ws::WSAESHUTDOWN => Shutdown,
        ws::WSAETIMEDOUT => ConnectionTimedOut,
        ws::WSAEWOULDBLOCK => WouldBlock,
        ws::WSANOTINITIALISED => Network,
        ws::WSASYSNOTREADY => SystemResources,
        ws::WSAVERNOTSUPPORTED => Unsupported,
        _ => Generic,
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type returned by all fallible SIO operations.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind) -> Error {
        Error { kind }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Captures the calling thread's last native error and translates it.
    pub fn last_os_error() -> Error {
        let code = io::Error::last_os_error().raw_os_error().unwrap_or(0);
        #[cfg(unix)]
        let kind = ErrorKind::from_raw_os_error(code);
        #[cfg(windows)]
        let kind = ErrorKind::from_raw_os_error(code as u32);
        Error { kind }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match err.kind {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
            ErrorKind::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset => io::ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted => io::ErrorKind::ConnectionAborted,
            ErrorKind::NotConnected => io::ErrorKind::NotConnected,
            ErrorKind::AddrInUse => io::ErrorKind::AddrInUse,
            ErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            ErrorKind::WouldBlock => io::ErrorKind::WouldBlock,
            ErrorKind::InvalidParam | ErrorKind::InvalidAddress => io::ErrorKind::InvalidInput,
            ErrorKind::TimedOut | ErrorKind::ConnectionTimedOut => io::ErrorKind::TimedOut,
            ErrorKind::Interrupted => io::ErrorKind::Interrupted,
            ErrorKind::Unsupported | ErrorKind::NotImplemented => io::ErrorKind::Unsupported,
            ErrorKind::EndOfStream => io::ErrorKind::UnexpectedEof,
            ErrorKind::OutOfMemory => io::ErrorKind::OutOfMemory,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.kind.as_str())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Error").field(&self.kind).finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())
    }
}

impl error::Error for Error {}
