use std::io::SeekFrom;

use crate::stream::{OpFlags, OptionValue, RawStream, StreamFlags, StreamOption};
use crate::{Buffer, Error, ErrorKind, Result};

/// Buffer-backend state: a seekable stream over a [`Buffer`].
///
/// The buffer is owned by the stream and released on close; whether the
/// underlying memory is freed follows the buffer's own ownership.
pub(crate) struct BufferStream {
    buffer: Option<Buffer>,
    flags: StreamFlags,
}

impl BufferStream {
    pub fn new(buffer: Buffer, flags: StreamFlags) -> BufferStream {
        BufferStream {
            buffer: Some(buffer),
            flags,
        }
    }

    fn buffer(&self) -> Result<&Buffer> {
        self.buffer
            .as_ref()
            .ok_or(Error::new(ErrorKind::AlreadyClosed))
    }

    fn buffer_mut(&mut self) -> Result<&mut Buffer> {
        self.buffer
            .as_mut()
            .ok_or(Error::new(ErrorKind::AlreadyClosed))
    }

    fn readable(&self) -> Result<()> {
        if self.flags.contains(StreamFlags::READ) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::PermissionDenied))
        }
    }

    fn writable(&self) -> Result<()> {
        if self.flags.contains(StreamFlags::WRITE) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::PermissionDenied))
        }
    }
}

impl RawStream for BufferStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        match self.buffer.take() {
            Some(buffer) => {
                drop(buffer);
                Ok(())
            }
            None => Err(Error::new(ErrorKind::AlreadyClosed)),
        }
    }

    fn read(&mut self, buf: &mut [u8], _flags: OpFlags) -> Result<usize> {
        self.readable()?;
        self.buffer_mut()?.read(buf)
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        self.writable()?;
        self.buffer_mut()?.write(buf)?;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let buffer = self.buffer_mut()?;
        match pos {
            SeekFrom::Start(position) => buffer.seek(position as usize)?,
            SeekFrom::Current(offset) => buffer.seek_relative(offset)?,
            SeekFrom::End(offset) => {
                let target = buffer.len() as i64 + offset;
                if target < 0 || target as usize > buffer.len() {
                    return Err(Error::new(ErrorKind::InvalidParam));
                }
                buffer.seek(target as usize)?;
            }
        }
        Ok(buffer.position() as u64)
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        self.writable()?;
        let buffer = self.buffer_mut()?;
        let size = size as usize;

        if size < buffer.len() {
            buffer.set_used_len(size)?;
            // Give memory back once more than half the capacity is idle.
            if buffer.owns_memory() && !buffer.is_mmap() && buffer.len() < buffer.capacity() / 2
            {
                buffer.shrink_to_fit()?;
            }
        } else if size > buffer.len() {
            buffer.set_used_len(size)?;
        }
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.buffer()?.len() as u64)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let buffer = self.buffer()?;
        match option {
            StreamOption::Position => Ok(OptionValue::UInt(buffer.position() as u64)),
            StreamOption::Size => Ok(OptionValue::UInt(buffer.len() as u64)),
            StreamOption::Eof => Ok(OptionValue::Bool(buffer.at_end())),
            StreamOption::BufferSize => Ok(OptionValue::UInt(buffer.capacity() as u64)),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        match option {
            StreamOption::BufferSize => {
                let capacity = value.as_uint()? as usize;
                self.buffer_mut()?.resize(capacity)
            }
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

/// Raw-memory-backend state: a fixed-length span of caller-owned memory.
///
/// Close forgets the pointer without freeing anything.
pub(crate) struct RawMemoryStream {
    ptr: *mut u8,
    len: usize,
    position: usize,
    flags: StreamFlags,
}

impl RawMemoryStream {
    pub fn new(ptr: *mut u8, len: usize, flags: StreamFlags) -> RawMemoryStream {
        RawMemoryStream {
            ptr,
            len,
            position: 0,
            flags,
        }
    }

    fn span(&self) -> Result<()> {
        if self.ptr.is_null() {
            Err(Error::new(ErrorKind::AlreadyClosed))
        } else {
            Ok(())
        }
    }
}

impl RawStream for RawMemoryStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        self.span()?;
        self.ptr = std::ptr::null_mut();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _flags: OpFlags) -> Result<usize> {
        self.span()?;
        if !self.flags.contains(StreamFlags::READ) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.len - self.position;
        if remaining == 0 {
            return Err(Error::new(ErrorKind::EndOfStream));
        }
        let n = buf.len().min(remaining);
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.add(self.position), buf.as_mut_ptr(), n);
        }
        self.position += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8], _flags: OpFlags) -> Result<usize> {
        self.span()?;
        if !self.flags.contains(StreamFlags::WRITE) {
            return Err(Error::new(ErrorKind::PermissionDenied));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.len - self.position;
        if remaining == 0 {
            return Err(Error::new(ErrorKind::EndOfStream));
        }
        let n = buf.len().min(remaining);
        unsafe {
            std::ptr::copy_nonoverlapping(buf.as_ptr(), self.ptr.add(self.position), n);
        }
        self.position += n;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.span()?;
        let target = match pos {
            SeekFrom::Start(position) => position as i64,
            SeekFrom::Current(offset) => self.position as i64 + offset,
            SeekFrom::End(offset) => self.len as i64 + offset,
        };
        if target < 0 || target as usize > self.len {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        self.position = target as usize;
        Ok(self.position as u64)
    }

    fn size(&self) -> Result<u64> {
        self.span()?;
        Ok(self.len as u64)
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        self.span()?;
        match option {
            StreamOption::Position => Ok(OptionValue::UInt(self.position as u64)),
            StreamOption::Size => Ok(OptionValue::UInt(self.len as u64)),
            StreamOption::Eof => Ok(OptionValue::Bool(self.position >= self.len)),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}
