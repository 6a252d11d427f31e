use log::trace;

use crate::stream::{OpFlags, OptionValue, RawHandle, RawStream, StreamFlags, StreamOption};
use crate::sys;
use crate::{Error, ErrorKind, Result};

/// Timer-backend state.
///
/// Reads yield the expiration count since the previous read as 8 bytes in
/// host order. Writes re-arm the timer: the first 8 bytes are the
/// milliseconds until the next expiry, an optional second 8-byte word sets
/// the repeat period (absent means one-shot from then on).
///
/// Backed by `timerfd` on Linux and Android and a waitable timer on
/// Windows; other platforms have no timer backend.
pub(crate) struct TimerStream {
    handle: sys::FileHandle,
    flags: StreamFlags,
}

#[cfg(any(target_os = "linux", target_os = "android", windows))]
impl TimerStream {
    pub fn open(interval_ms: u64, oneshot: bool, flags: StreamFlags) -> Result<TimerStream> {
        let handle = sys::timer::create(interval_ms, oneshot)?;
        trace!(
            "opened timer stream: interval {} ms, oneshot {}",
            interval_ms,
            oneshot
        );
        Ok(TimerStream { handle, flags })
    }

    pub fn from_handle(handle: RawHandle, flags: StreamFlags) -> Result<TimerStream> {
        Ok(TimerStream {
            handle: sys::file::from_raw_handle(handle),
            flags,
        })
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl TimerStream {
    pub fn open(_interval_ms: u64, _oneshot: bool, _flags: StreamFlags) -> Result<TimerStream> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    pub fn from_handle(_handle: RawHandle, _flags: StreamFlags) -> Result<TimerStream> {
        Err(Error::new(ErrorKind::Unsupported))
    }
}

impl TimerStream {
    fn handle(&self) -> Result<sys::FileHandle> {
        if self.handle == sys::INVALID_FILE {
            Err(Error::new(ErrorKind::AlreadyClosed))
        } else {
            Ok(self.handle)
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android", windows))]
impl RawStream for TimerStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        let handle = self.handle()?;
        self.handle = sys::INVALID_FILE;
        sys::timer::close(handle)
    }

    fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize> {
        if !self.flags.contains(StreamFlags::READ) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        let handle = self.handle()?;
        if buf.len() < 8 {
            return Err(Error::new(ErrorKind::BufferTooSmall));
        }
        let wait = !flags.contains(OpFlags::DONT_WAIT)
            && !self.flags.contains(StreamFlags::NONBLOCK);
        let expirations = sys::timer::read(handle, wait)?;
        buf[..8].copy_from_slice(&expirations.to_ne_bytes());
        Ok(8)
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        if !self.flags.contains(StreamFlags::WRITE) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        let handle = self.handle()?;
        if buf.len() < 8 {
            return Err(Error::new(ErrorKind::InvalidParam));
        }

        let value_ms = u64::from_ne_bytes(buf[..8].try_into().unwrap());
        // A second word re-arms with a distinct period; without one the
        // timer becomes one-shot from here.
        let (period_ms, consumed) = if buf.len() >= 16 {
            (u64::from_ne_bytes(buf[8..16].try_into().unwrap()), 16)
        } else {
            (0, 8)
        };
        sys::timer::set(handle, value_ms, period_ms)?;
        Ok(consumed)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let handle = self.handle()?;
        match option {
            StreamOption::Handle => Ok(OptionValue::Handle(sys::file::as_raw_handle(handle))),
            StreamOption::TimerInterval => {
                let (interval_ms, _) = sys::timer::get(handle)?;
                Ok(OptionValue::UInt(interval_ms))
            }
            StreamOption::TimerOneshot => {
                let (_, oneshot) = sys::timer::get(handle)?;
                Ok(OptionValue::Bool(oneshot))
            }
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        let handle = self.handle()?;
        match option {
            StreamOption::TimerInterval => sys::timer::set_interval(handle, value.as_uint()?),
            StreamOption::TimerOneshot => sys::timer::set_oneshot(handle, value.as_bool()?),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl RawStream for TimerStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn read(&mut self, _buf: &mut [u8], _flags: OpFlags) -> Result<usize> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    fn write(&mut self, _buf: &[u8], _flags: OpFlags) -> Result<usize> {
        Err(Error::new(ErrorKind::Unsupported))
    }
}

impl Drop for TimerStream {
    fn drop(&mut self) {
        #[cfg(any(target_os = "linux", target_os = "android", windows))]
        if self.handle != sys::INVALID_FILE {
            let _ = sys::timer::close(self.handle);
        }
    }
}
