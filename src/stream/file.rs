use std::io::SeekFrom;
use std::path::Path;

use log::trace;

use crate::stream::{
    Backend, OpFlags, OptionValue, RawHandle, RawStream, Stream, StreamFlags, StreamKind,
    StreamOption,
};
use crate::sys;
use crate::{Error, ErrorKind, Result};

/// File-backend state, also used for pipes, terminals and the standard
/// streams.
///
/// The native handle is invalidated on the first successful close; `owned`
/// is false for the standard streams, whose handles belong to the process.
pub(crate) struct FileStream {
    handle: sys::FileHandle,
    owned: bool,
    flags: StreamFlags,
}

pub(crate) enum StdioHandle {
    Stdin,
    Stdout,
    Stderr,
}

/// Builds a non-owning stream over one of the standard handles. Cheap
/// enough to construct per call; the handle itself is process-global.
pub(crate) fn stdio(which: StdioHandle) -> Stream {
    let (handle, flags) = match which {
        StdioHandle::Stdin => (sys::file::stdin_handle(), StreamFlags::READ),
        StdioHandle::Stdout => (sys::file::stdout_handle(), StreamFlags::WRITE),
        StdioHandle::Stderr => (sys::file::stderr_handle(), StreamFlags::WRITE),
    };
    Stream::new(
        StreamKind::File,
        Backend::File(FileStream {
            handle,
            owned: false,
            flags,
        }),
    )
}

impl FileStream {
    pub fn open(path: &Path, flags: StreamFlags, mode: u32) -> Result<FileStream> {
        let handle = sys::file::open(path, flags, mode)?;
        trace!("opened file stream for {:?}", path);
        Ok(FileStream {
            handle,
            owned: true,
            flags,
        })
    }

    pub fn open_terminal(device: Option<&Path>, flags: StreamFlags) -> Result<FileStream> {
        let default = Path::new(sys::file::TERMINAL_DEVICE);
        FileStream::open(device.unwrap_or(default), flags, 0)
    }

    pub fn from_handle(handle: RawHandle, flags: StreamFlags, owned: bool) -> FileStream {
        FileStream::from_native(sys::file::from_raw_handle(handle), flags, owned)
    }

    pub fn from_native(handle: sys::FileHandle, flags: StreamFlags, owned: bool) -> FileStream {
        FileStream {
            handle,
            owned,
            flags,
        }
    }

    fn handle(&self) -> Result<sys::FileHandle> {
        if self.handle == sys::INVALID_FILE {
            Err(Error::new(ErrorKind::AlreadyClosed))
        } else {
            Ok(self.handle)
        }
    }

    fn readable(&self) -> Result<sys::FileHandle> {
        if !self.flags.contains(StreamFlags::READ) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        self.handle()
    }

    fn writable(&self) -> Result<sys::FileHandle> {
        if !self.flags.contains(StreamFlags::WRITE) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        self.handle()
    }

    pub fn lock(&mut self, offset: u64, len: u64, exclusive: bool, wait: bool) -> Result<()> {
        let handle = self.handle()?;
        sys::file::lock(handle, offset, len, exclusive, wait)
    }

    pub fn unlock(&mut self, offset: u64, len: u64) -> Result<()> {
        let handle = self.handle()?;
        sys::file::unlock(handle, offset, len)
    }

    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let handle = self.readable()?;
        match sys::file::read_at(handle, buf, offset)? {
            0 if !buf.is_empty() => Err(Error::new(ErrorKind::EndOfStream)),
            n => Ok(n),
        }
    }

    pub fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let handle = self.writable()?;
        sys::file::write_at(handle, buf, offset)
    }
}

impl RawStream for FileStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        let handle = self.handle()?;
        // Invalidate first: even a failed close leaves the handle unusable.
        self.handle = sys::INVALID_FILE;
        if self.owned {
            sys::file::close(handle)
        } else {
            Ok(())
        }
    }

    fn read(&mut self, buf: &mut [u8], _flags: OpFlags) -> Result<usize> {
        let handle = self.readable()?;
        let retry = !self.flags.contains(StreamFlags::NONBLOCK);
        match sys::file::read(handle, buf, retry)? {
            0 if !buf.is_empty() => Err(Error::new(ErrorKind::EndOfStream)),
            n => Ok(n),
        }
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        let handle = self.writable()?;
        // Windows has no O_APPEND; emulate by seeking to the end first.
        #[cfg(windows)]
        if self.flags.contains(StreamFlags::APPEND) {
            sys::file::seek(handle, SeekFrom::End(0))?;
        }
        let retry = !self.flags.contains(StreamFlags::NONBLOCK);
        sys::file::write(handle, buf, retry)
    }

    fn flush(&mut self) -> Result<()> {
        let handle = self.writable()?;
        sys::file::sync(handle)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let handle = self.handle()?;
        sys::file::seek(handle, pos)
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        let handle = self.writable()?;
        sys::file::truncate(handle, size)
    }

    fn size(&self) -> Result<u64> {
        let handle = self.handle()?;
        sys::file::size(handle)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let handle = self.handle()?;
        match option {
            StreamOption::Position => {
                sys::file::seek(handle, SeekFrom::Current(0)).map(OptionValue::UInt)
            }
            StreamOption::Size => sys::file::size(handle).map(OptionValue::UInt),
            StreamOption::Eof => {
                let position = sys::file::seek(handle, SeekFrom::Current(0))?;
                let size = sys::file::size(handle)?;
                Ok(OptionValue::Bool(position >= size))
            }
            StreamOption::Handle => Ok(OptionValue::Handle(sys::file::as_raw_handle(handle))),
            StreamOption::Blocking => {
                #[cfg(unix)]
                {
                    sys::get_nonblocking(handle).map(|nb| OptionValue::Bool(!nb))
                }
                #[cfg(windows)]
                {
                    // File handles have no non-blocking mode on Windows.
                    Ok(OptionValue::Bool(true))
                }
            }
            #[cfg(unix)]
            StreamOption::CloseOnExec => sys::get_cloexec(handle).map(OptionValue::Bool),
            #[cfg(unix)]
            StreamOption::Append => {
                let status = sys::file::status_flags(handle)?;
                Ok(OptionValue::Bool(status & libc::O_APPEND != 0))
            }
            #[cfg(unix)]
            StreamOption::Sync => {
                let status = sys::file::status_flags(handle)?;
                Ok(OptionValue::Bool(status & libc::O_SYNC != 0))
            }
            #[cfg(unix)]
            StreamOption::Direct => {
                #[cfg(any(target_os = "linux", target_os = "android"))]
                {
                    let status = sys::file::status_flags(handle)?;
                    Ok(OptionValue::Bool(status & libc::O_DIRECT != 0))
                }
                #[cfg(not(any(target_os = "linux", target_os = "android")))]
                Ok(OptionValue::Bool(false))
            }
            #[cfg(windows)]
            StreamOption::Append => Ok(OptionValue::Bool(
                self.flags.contains(StreamFlags::APPEND),
            )),
            #[cfg(windows)]
            StreamOption::Sync => Ok(OptionValue::Bool(self.flags.contains(StreamFlags::SYNC))),
            #[cfg(windows)]
            StreamOption::Direct => Ok(OptionValue::Bool(
                self.flags.contains(StreamFlags::DIRECT),
            )),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        let handle = self.handle()?;
        match option {
            StreamOption::Blocking => {
                let blocking = value.as_bool()?;
                #[cfg(unix)]
                {
                    sys::set_nonblocking(handle, !blocking)?;
                    self.flags.set(StreamFlags::NONBLOCK, !blocking);
                    Ok(())
                }
                #[cfg(windows)]
                {
                    let _ = handle;
                    if blocking {
                        Ok(())
                    } else {
                        Err(Error::new(ErrorKind::Unsupported))
                    }
                }
            }
            #[cfg(unix)]
            StreamOption::CloseOnExec => sys::set_cloexec(handle, value.as_bool()?),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        if self.handle != sys::INVALID_FILE && self.owned {
            let _ = sys::file::close(self.handle);
        }
    }
}
