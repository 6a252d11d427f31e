use log::trace;

use crate::stream::{OpFlags, OptionValue, RawHandle, RawStream, StreamFlags, StreamOption};
use crate::sys;
use crate::{Error, ErrorKind, Result};

/// One received signal, as yielded by [`Stream::read_signal`].
///
/// On Windows the console control handler does not preserve the triggering
/// signal, so `signo`, `pid` and `uid` are all zero there.
///
/// [`Stream::read_signal`]: crate::Stream::read_signal
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SignalInfo {
    /// The signal number.
    pub signo: u32,
    /// The signal code.
    pub code: i32,
    /// Sending process, where the kernel provides it.
    pub pid: u32,
    /// Sending user, where the kernel provides it.
    pub uid: u32,
}

/// Signal-backend state.
///
/// On Linux and Android the requested signals are blocked process-wide and
/// routed to a `signalfd`; close unblocks them again. On Windows a
/// manual-reset event is registered with the process-global console control
/// handler. Other platforms have no signal backend.
///
/// Reads fill the caller's buffer with the full native signal-info record
/// when it fits, else with the 32-bit signal number. Writes send a signal:
/// the first 32-bit word is the signal number, an optional second word a
/// target pid (0 meaning the current process).
pub(crate) struct SignalStream {
    handle: sys::FileHandle,
    flags: StreamFlags,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    mask: libc::sigset_t,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl SignalStream {
    pub fn open(signals: &[i32], flags: StreamFlags) -> Result<SignalStream> {
        if signals.is_empty() {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        let (handle, mask) = sys::signal::open(signals)?;
        trace!("opened signal stream for {:?}", signals);
        Ok(SignalStream {
            handle,
            flags,
            mask,
        })
    }

    pub fn from_handle(handle: RawHandle, flags: StreamFlags) -> Result<SignalStream> {
        // The original mask is unknown for an adopted descriptor; close
        // will have nothing to unblock.
        let mask = unsafe { std::mem::zeroed::<libc::sigset_t>() };
        Ok(SignalStream {
            handle: sys::file::from_raw_handle(handle),
            flags,
            mask,
        })
    }

    fn read_native(&mut self, flags: OpFlags) -> Result<libc::signalfd_siginfo> {
        if !self.flags.contains(StreamFlags::READ) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        let handle = self.handle()?;
        let wait = !flags.contains(OpFlags::DONT_WAIT)
            && !self.flags.contains(StreamFlags::NONBLOCK);
        sys::signal::read(handle, wait)
    }

    pub fn read_info(&mut self, flags: OpFlags) -> Result<SignalInfo> {
        let info = self.read_native(flags)?;
        Ok(SignalInfo {
            signo: info.ssi_signo,
            code: info.ssi_code,
            pid: info.ssi_pid,
            uid: info.ssi_uid,
        })
    }
}

#[cfg(windows)]
impl SignalStream {
    pub fn open(signals: &[i32], flags: StreamFlags) -> Result<SignalStream> {
        if signals.is_empty() {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        let handle = sys::signal::open(signals)?;
        trace!("opened signal stream for {:?}", signals);
        Ok(SignalStream { handle, flags })
    }

    pub fn from_handle(handle: RawHandle, flags: StreamFlags) -> Result<SignalStream> {
        Ok(SignalStream {
            handle: sys::file::from_raw_handle(handle),
            flags,
        })
    }

    pub fn read_info(&mut self, flags: OpFlags) -> Result<SignalInfo> {
        if !self.flags.contains(StreamFlags::READ) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        let handle = self.handle()?;
        let wait = !flags.contains(OpFlags::DONT_WAIT)
            && !self.flags.contains(StreamFlags::NONBLOCK);
        // The control handler cannot preserve which signal fired.
        sys::signal::read(handle, wait)?;
        Ok(SignalInfo::default())
    }
}

#[cfg(windows)]
impl RawStream for SignalStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        let handle = self.handle()?;
        self.handle = sys::INVALID_FILE;
        sys::signal::close(handle)
    }

    fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize> {
        let info = self.read_info(flags)?;
        if buf.len() < 4 {
            return Err(Error::new(ErrorKind::BufferTooSmall));
        }
        buf[..4].copy_from_slice(&info.signo.to_ne_bytes());
        Ok(4)
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        if !self.flags.contains(StreamFlags::WRITE) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        self.handle()?;
        if buf.len() < 4 {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        let signo = i32::from_ne_bytes(buf[..4].try_into().unwrap());
        sys::signal::send(signo)?;
        Ok(4)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let handle = self.handle()?;
        match option {
            StreamOption::Handle => Ok(OptionValue::Handle(sys::file::as_raw_handle(handle))),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl SignalStream {
    pub fn open(_signals: &[i32], _flags: StreamFlags) -> Result<SignalStream> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    pub fn from_handle(_handle: RawHandle, _flags: StreamFlags) -> Result<SignalStream> {
        Err(Error::new(ErrorKind::Unsupported))
    }

    pub fn read_info(&mut self, _flags: OpFlags) -> Result<SignalInfo> {
        Err(Error::new(ErrorKind::Unsupported))
    }
}

impl SignalStream {
    fn handle(&self) -> Result<sys::FileHandle> {
        if self.handle == sys::INVALID_FILE {
            Err(Error::new(ErrorKind::AlreadyClosed))
        } else {
            Ok(self.handle)
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl RawStream for SignalStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        let handle = self.handle()?;
        self.handle = sys::INVALID_FILE;
        sys::signal::close(handle, &self.mask)
    }

    fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize> {
        let info = self.read_native(flags)?;
        let info_size = std::mem::size_of::<libc::signalfd_siginfo>();
        if buf.len() >= info_size {
            let bytes = unsafe {
                std::slice::from_raw_parts(&info as *const _ as *const u8, info_size)
            };
            buf[..info_size].copy_from_slice(bytes);
            Ok(info_size)
        } else if buf.len() >= 4 {
            buf[..4].copy_from_slice(&info.ssi_signo.to_ne_bytes());
            Ok(4)
        } else {
            Err(Error::new(ErrorKind::BufferTooSmall))
        }
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        if !self.flags.contains(StreamFlags::WRITE) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        self.handle()?;
        if buf.len() < 4 {
            return Err(Error::new(ErrorKind::InvalidParam));
        }

        let signo = i32::from_ne_bytes(buf[..4].try_into().unwrap());
        let (pid, consumed) = if buf.len() >= 8 {
            (i32::from_ne_bytes(buf[4..8].try_into().unwrap()), 8)
        } else {
            (0, 4)
        };
        sys::signal::send(signo, pid)?;
        Ok(consumed)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let handle = self.handle()?;
        match option {
            StreamOption::Handle => Ok(OptionValue::Handle(sys::file::as_raw_handle(handle))),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl RawStream for SignalStream {
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

impl Drop for SignalStream {
    fn drop(&mut self) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        if self.handle != sys::INVALID_FILE {
            let _ = sys::signal::close(self.handle, &self.mask);
        }
        #[cfg(windows)]
        if self.handle != sys::INVALID_FILE {
            let _ = sys::signal::close(self.handle);
        }
    }
}
