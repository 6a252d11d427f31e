use windows_sys::Win32::Foundation::{WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::System::Threading::{
    CancelWaitableTimer, CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
};

use super::{close_handle, FileHandle};
use crate::{Error, ErrorKind, Result};

/// Creates and arms a waitable timer. One-shot timers are manual-reset so
/// an expiry stays observable until read.
pub fn create(interval_ms: u64, oneshot: bool) -> Result<FileHandle> {
    let handle =
        unsafe { CreateWaitableTimerW(std::ptr::null(), oneshot as i32, std::ptr::null()) };
    if handle.is_null() {
        return Err(Error::last_os_error());
    }
    if let Err(err) = set(handle, interval_ms, if oneshot { 0 } else { interval_ms }) {
        let _ = close_handle(handle);
        return Err(err);
    }
    Ok(handle)
}

/// Re-arms the timer: relative due time in 100 ns units, period in
/// milliseconds (0 for one-shot).
pub fn set(handle: FileHandle, value_ms: u64, period_ms: u64) -> Result<()> {
    let due = -((value_ms as i64) * 10_000);
    let ok = unsafe {
        SetWaitableTimer(
            handle,
            &due,
            period_ms.min(i32::MAX as u64) as i32,
            None,
            std::ptr::null(),
            0,
        )
    };
    if ok == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

/// The armed interval is not queryable on Windows; report an unarmed
/// periodic timer.
pub fn get(_handle: FileHandle) -> Result<(u64, bool)> {
    Ok((0, false))
}

pub fn set_interval(handle: FileHandle, interval_ms: u64) -> Result<()> {
    set(handle, interval_ms, interval_ms)
}

/// The current interval cannot be read back to re-apply it.
pub fn set_oneshot(_handle: FileHandle, _oneshot: bool) -> Result<()> {
    Err(Error::new(ErrorKind::Unsupported))
}

/// Waits for the timer and reports one expiration. Waitable timers do not
/// count missed periods.
pub fn read(handle: FileHandle, wait: bool) -> Result<u64> {
    let timeout = if wait { INFINITE } else { 0 };
    match unsafe { WaitForSingleObject(handle, timeout) } {
        WAIT_OBJECT_0 => Ok(1),
        WAIT_TIMEOUT => Err(Error::new(ErrorKind::WouldBlock)),
        _ => Err(Error::last_os_error()),
    }
}

pub fn close(handle: FileHandle) -> Result<()> {
    unsafe {
        CancelWaitableTimer(handle);
    }
    close_handle(handle)
}
