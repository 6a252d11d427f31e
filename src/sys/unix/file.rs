use std::ffi::CString;
use std::io::SeekFrom;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

use crate::stream::StreamFlags;
use crate::{Error, ErrorKind, Result};

fn c_path(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::new(ErrorKind::BadPath))
}

/// Translates the portable flag set into `open(2)` flags and opens the file.
///
/// Descriptors are always opened close-on-exec.
pub fn open(path: &Path, flags: StreamFlags, mode: u32) -> Result<RawFd> {
    let path = c_path(path)?;

    let mut oflags = match (
        flags.contains(StreamFlags::READ),
        flags.contains(StreamFlags::WRITE),
    ) {
        (true, true) => libc::O_RDWR,
        (false, true) => libc::O_WRONLY,
        // Default to read-only, matching `O_RDONLY == 0`.
        _ => libc::O_RDONLY,
    };
    oflags |= libc::O_CLOEXEC;

    if flags.contains(StreamFlags::CREATE) {
        oflags |= libc::O_CREAT;
    }
    if flags.contains(StreamFlags::EXCL) {
        oflags |= libc::O_EXCL;
    }
    if flags.contains(StreamFlags::TRUNC) {
        oflags |= libc::O_TRUNC;
    }
    if flags.contains(StreamFlags::APPEND) {
        oflags |= libc::O_APPEND;
    }
    if flags.contains(StreamFlags::NONBLOCK) {
        oflags |= libc::O_NONBLOCK;
    }
    if flags.contains(StreamFlags::SYNC) {
        oflags |= libc::O_SYNC;
    }
    if flags.contains(StreamFlags::DIRECT) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            oflags |= libc::O_DIRECT;
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        return Err(Error::new(ErrorKind::Unsupported));
    }

    syscall!(open(path.as_ptr(), oflags, mode as libc::c_uint))
}

/// Single `read(2)`, retrying `EINTR` when `retry` is set.
pub fn read(fd: RawFd, buf: &mut [u8], retry: bool) -> Result<usize> {
    loop {
        match syscall!(read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Single `write(2)`, retrying `EINTR` when `retry` is set.
pub fn write(fd: RawFd, buf: &[u8], retry: bool) -> Result<usize> {
    loop {
        match syscall!(write(fd, buf.as_ptr() as *const libc::c_void, buf.len())) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Positioned read; does not move the file cursor.
pub fn read_at(fd: RawFd, buf: &mut [u8], offset: u64) -> Result<usize> {
    loop {
        match syscall!(pread(
            fd,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            offset as libc::off_t,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Positioned write; does not move the file cursor.
pub fn write_at(fd: RawFd, buf: &[u8], offset: u64) -> Result<usize> {
    loop {
        match syscall!(pwrite(
            fd,
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            offset as libc::off_t,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

pub fn seek(fd: RawFd, pos: SeekFrom) -> Result<u64> {
    let (whence, offset) = match pos {
        SeekFrom::Start(offset) => (libc::SEEK_SET, offset as libc::off_t),
        SeekFrom::Current(offset) => (libc::SEEK_CUR, offset as libc::off_t),
        SeekFrom::End(offset) => (libc::SEEK_END, offset as libc::off_t),
    };
    syscall!(lseek(fd, offset, whence)).map(|new_pos| new_pos as u64)
}

pub fn truncate(fd: RawFd, size: u64) -> Result<()> {
    syscall!(ftruncate(fd, size as libc::off_t)).map(drop)
}

pub fn sync(fd: RawFd) -> Result<()> {
    syscall!(fsync(fd)).map(drop)
}

pub fn size(fd: RawFd) -> Result<u64> {
    let mut stat = unsafe { std::mem::zeroed::<libc::stat>() };
    syscall!(fstat(fd, &mut stat))?;
    Ok(stat.st_size as u64)
}

/// Applies an advisory record lock. `len == 0` locks to end of file.
pub fn lock(fd: RawFd, offset: u64, len: u64, exclusive: bool, wait: bool) -> Result<()> {
    let mut fl = unsafe { std::mem::zeroed::<libc::flock>() };
    fl.l_type = if exclusive {
        libc::F_WRLCK as libc::c_short
    } else {
        libc::F_RDLCK as libc::c_short
    };
    fl.l_whence = libc::SEEK_SET as libc::c_short;
    fl.l_start = offset as libc::off_t;
    fl.l_len = len as libc::off_t;

    let cmd = if wait { libc::F_SETLKW } else { libc::F_SETLK };
    loop {
        match syscall!(fcntl(fd, cmd, &fl)) {
            Ok(_) => return Ok(()),
            Err(err) if wait && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Releases an advisory record lock over the same region.
pub fn unlock(fd: RawFd, offset: u64, len: u64) -> Result<()> {
    let mut fl = unsafe { std::mem::zeroed::<libc::flock>() };
    fl.l_type = libc::F_UNLCK as libc::c_short;
    fl.l_whence = libc::SEEK_SET as libc::c_short;
    fl.l_start = offset as libc::off_t;
    fl.l_len = len as libc::off_t;
    syscall!(fcntl(fd, libc::F_SETLK, &fl)).map(drop)
}

/// Raw `F_GETFL` status flags, for the append/sync/direct options.
pub fn status_flags(fd: RawFd) -> Result<i32> {
    syscall!(fcntl(fd, libc::F_GETFL))
}

pub fn close(fd: RawFd) -> Result<()> {
    crate::sys::close(fd)
}

/// Unix handles and the public [`RawHandle`](crate::stream::RawHandle) are
/// both plain descriptors.
pub fn from_raw_handle(handle: crate::stream::RawHandle) -> RawFd {
    handle
}

pub fn as_raw_handle(fd: RawFd) -> crate::stream::RawHandle {
    fd
}

pub fn stdin_handle() -> RawFd {
    libc::STDIN_FILENO
}

pub fn stdout_handle() -> RawFd {
    libc::STDOUT_FILENO
}

pub fn stderr_handle() -> RawFd {
    libc::STDERR_FILENO
}

/// Path of the controlling terminal.
pub const TERMINAL_DEVICE: &str = "/dev/tty";
