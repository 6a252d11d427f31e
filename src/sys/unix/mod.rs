/// Helper macro to execute a system call that returns an `io::Result`-style
/// value (`-1` means error, consult `errno`).
macro_rules! syscall {
    ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
        #[allow(unused_unsafe)]
        let res = unsafe { libc::$fn($($arg, )*) };
        if res == -1 {
            Err(crate::error::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
}

pub mod file;
pub mod mmap;
pub mod net;
pub mod pipe;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod signal;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod timer;

pub use self::mmap::Mmap;

use std::os::unix::io::RawFd;

use crate::Result;

/// Native file (and pipe, terminal, timer, signal) handle.
pub type FileHandle = RawFd;
/// Native socket handle.
pub type SocketHandle = RawFd;

/// Sentinel stored once a handle has been closed.
pub const INVALID_FILE: FileHandle = -1;
/// Sentinel stored once a socket has been closed.
pub const INVALID_SOCKET: SocketHandle = -1;

/// Closes a descriptor, reporting the translated error.
pub fn close(fd: RawFd) -> Result<()> {
    syscall!(close(fd)).map(drop)
}

/// Queries `O_NONBLOCK` from the descriptor's status flags.
pub fn get_nonblocking(fd: RawFd) -> Result<bool> {
    let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
    Ok(flags & libc::O_NONBLOCK != 0)
}

/// Sets or clears `O_NONBLOCK` on the descriptor.
pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<()> {
    let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
    let new = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    if new != flags {
        syscall!(fcntl(fd, libc::F_SETFL, new))?;
    }
    Ok(())
}

/// Queries `FD_CLOEXEC`.
pub fn get_cloexec(fd: RawFd) -> Result<bool> {
    let flags = syscall!(fcntl(fd, libc::F_GETFD))?;
    Ok(flags & libc::FD_CLOEXEC != 0)
}

/// Sets or clears `FD_CLOEXEC`.
pub fn set_cloexec(fd: RawFd, cloexec: bool) -> Result<()> {
    let flags = syscall!(fcntl(fd, libc::F_GETFD))?;
    let new = if cloexec {
        flags | libc::FD_CLOEXEC
    } else {
        flags & !libc::FD_CLOEXEC
    };
    if new != flags {
        syscall!(fcntl(fd, libc::F_SETFD, new))?;
    }
    Ok(())
}

/// Blocks until `fd` is readable. Used to wait on descriptors that are kept
/// in non-blocking mode internally (timers, signals).
pub fn wait_readable(fd: RawFd) -> Result<()> {
    loop {
        let mut readfds = unsafe { std::mem::zeroed::<libc::fd_set>() };
        unsafe {
            libc::FD_ZERO(&mut readfds);
            libc::FD_SET(fd, &mut readfds);
        }
        match syscall!(select(
            fd + 1,
            &mut readfds,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )) {
            Ok(_) => {
                if unsafe { libc::FD_ISSET(fd, &readfds) } {
                    return Ok(());
                }
            }
            Err(err) if err.kind() == crate::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
