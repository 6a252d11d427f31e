use std::os::unix::io::RawFd;

use crate::sys;
use crate::{ErrorKind, Result};

fn itimerspec(value_ms: u64, interval_ms: u64) -> libc::itimerspec {
    fn timespec(ms: u64) -> libc::timespec {
        libc::timespec {
            tv_sec: (ms / 1000) as libc::time_t,
            tv_nsec: ((ms % 1000) * 1_000_000) as libc::c_long,
        }
    }
    libc::itimerspec {
        it_value: timespec(value_ms),
        it_interval: timespec(interval_ms),
    }
}

/// Creates and arms a timer descriptor.
///
/// The descriptor itself is always non-blocking; blocking reads are built on
/// [`sys::wait_readable`].
pub fn create(interval_ms: u64, oneshot: bool) -> Result<RawFd> {
    let fd = syscall!(timerfd_create(
        libc::CLOCK_MONOTONIC,
        libc::TFD_NONBLOCK | libc::TFD_CLOEXEC,
    ))?;
    if let Err(err) = set(fd, interval_ms, if oneshot { 0 } else { interval_ms }) {
        let _ = sys::close(fd);
        return Err(err);
    }
    Ok(fd)
}

/// Re-arms the timer: `value_ms` until the next expiry, then every
/// `interval_ms` (0 for one-shot).
pub fn set(fd: RawFd, value_ms: u64, interval_ms: u64) -> Result<()> {
    let spec = itimerspec(value_ms, interval_ms);
    syscall!(timerfd_settime(fd, 0, &spec, std::ptr::null_mut())).map(drop)
}

pub fn close(fd: RawFd) -> Result<()> {
    sys::close(fd)
}

/// Changes the repeat interval, re-arming the pending expiry as well when
/// the timer is currently running.
pub fn set_interval(fd: RawFd, interval_ms: u64) -> Result<()> {
    let mut spec = unsafe { std::mem::zeroed::<libc::itimerspec>() };
    syscall!(timerfd_gettime(fd, &mut spec))?;
    let armed = spec.it_value.tv_sec != 0 || spec.it_value.tv_nsec != 0;
    set(fd, if armed { interval_ms } else { 0 }, interval_ms)
}

/// Switches between one-shot and periodic without changing the pending
/// expiry.
pub fn set_oneshot(fd: RawFd, oneshot: bool) -> Result<()> {
    let mut spec = unsafe { std::mem::zeroed::<libc::itimerspec>() };
    syscall!(timerfd_gettime(fd, &mut spec))?;
    let value_ms =
        spec.it_value.tv_sec as u64 * 1000 + spec.it_value.tv_nsec as u64 / 1_000_000;
    let interval_ms = if oneshot {
        0
    } else {
        let current =
            spec.it_interval.tv_sec as u64 * 1000 + spec.it_interval.tv_nsec as u64 / 1_000_000;
        current
    };
    set(fd, value_ms, interval_ms)
}

/// Returns `(interval_ms, oneshot)` for the armed timer.
pub fn get(fd: RawFd) -> Result<(u64, bool)> {
    let mut spec = unsafe { std::mem::zeroed::<libc::itimerspec>() };
    syscall!(timerfd_gettime(fd, &mut spec))?;
    let interval_ms =
        spec.it_interval.tv_sec as u64 * 1000 + spec.it_interval.tv_nsec as u64 / 1_000_000;
    Ok((interval_ms, interval_ms == 0))
}

/// Reads the expiration count, blocking via `select` when `wait` is set.
pub fn read(fd: RawFd, wait: bool) -> Result<u64> {
    loop {
        let mut count = [0u8; 8];
        match sys::file::read(fd, &mut count, false) {
            Ok(8) => return Ok(u64::from_ne_bytes(count)),
            Ok(_) => return Err(ErrorKind::Io.into()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock && wait => {
                sys::wait_readable(fd)?;
            }
            Err(err) => return Err(err),
        }
    }
}
