use std::mem;
use std::os::unix::io::RawFd;

use crate::sys;
use crate::{ErrorKind, Result};

/// Blocks `signals` process-wide and opens a `signalfd` for them.
///
/// Returns the descriptor and the blocked mask, which [`close`] unblocks
/// again.
pub fn open(signals: &[i32]) -> Result<(RawFd, libc::sigset_t)> {
    let mut mask = unsafe { mem::zeroed::<libc::sigset_t>() };
    unsafe {
        libc::sigemptyset(&mut mask);
        for signo in signals {
            libc::sigaddset(&mut mask, *signo);
        }
    }

    // Block first so no signal is lost between mask setup and fd creation.
    // pthread_sigmask reports its error as the return value, not via errno.
    let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &mask, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(ErrorKind::from_raw_os_error(rc).into());
    }

    match syscall!(signalfd(-1, &mask, libc::SFD_NONBLOCK | libc::SFD_CLOEXEC)) {
        Ok(fd) => Ok((fd, mask)),
        Err(err) => {
            unsafe {
                libc::pthread_sigmask(libc::SIG_UNBLOCK, &mask, std::ptr::null_mut());
            }
            Err(err)
        }
    }
}

/// Unblocks the stream's signals and closes the descriptor.
pub fn close(fd: RawFd, mask: &libc::sigset_t) -> Result<()> {
    unsafe {
        libc::pthread_sigmask(libc::SIG_UNBLOCK, mask, std::ptr::null_mut());
    }
    sys::close(fd)
}

/// Reads one queued `signalfd_siginfo`, blocking via `select` when `wait` is
/// set.
pub fn read(fd: RawFd, wait: bool) -> Result<libc::signalfd_siginfo> {
    let mut info = unsafe { mem::zeroed::<libc::signalfd_siginfo>() };
    let info_slice = unsafe {
        std::slice::from_raw_parts_mut(
            &mut info as *mut _ as *mut u8,
            mem::size_of::<libc::signalfd_siginfo>(),
        )
    };
    loop {
        match sys::file::read(fd, info_slice, false) {
            Ok(n) if n == mem::size_of::<libc::signalfd_siginfo>() => return Ok(info),
            Ok(_) => return Err(ErrorKind::Io.into()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock && wait => {
                sys::wait_readable(fd)?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Sends `signo` to `pid`, or to the current process when `pid` is 0.
pub fn send(signo: i32, pid: i32) -> Result<()> {
    let target = if pid != 0 {
        pid
    } else {
        unsafe { libc::getpid() }
    };
    syscall!(kill(target, signo)).map(drop)
}
