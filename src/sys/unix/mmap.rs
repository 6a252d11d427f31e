use std::path::Path;
use std::ptr;

use crate::sys::unix::file::{self, seek};
use crate::{Error, ErrorKind, Result};

/// A shared file mapping, unmapped on drop.
pub struct Mmap {
    ptr: *mut u8,
    len: usize,
    read_only: bool,
}

impl Mmap {
    /// Maps the whole of the file at `path`.
    pub fn map_file(path: &Path, read_only: bool) -> Result<Mmap> {
        let flags = if read_only {
            crate::stream::StreamFlags::READ
        } else {
            crate::stream::StreamFlags::READ | crate::stream::StreamFlags::WRITE
        };
        let fd = file::open(path, flags, 0)?;

        let result = (|| {
            let len = seek(fd, std::io::SeekFrom::End(0))? as usize;
            if len == 0 {
                // A zero-length mapping is invalid; report it as the mmap
                // failure it would otherwise become.
                return Err(Error::new(ErrorKind::InvalidParam));
            }
            let prot = if read_only {
                libc::PROT_READ
            } else {
                libc::PROT_READ | libc::PROT_WRITE
            };
            let ptr = unsafe {
                libc::mmap(ptr::null_mut(), len, prot, libc::MAP_SHARED, fd, 0)
            };
            if ptr == libc::MAP_FAILED {
                return Err(Error::last_os_error());
            }
            Ok(Mmap {
                ptr: ptr as *mut u8,
                len,
                read_only,
            })
        })();

        // The mapping keeps its own reference to the file.
        let _ = crate::sys::close(fd);
        result
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Callers must have checked `read_only` first; writing through a
    /// `PROT_READ` mapping faults.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        debug_assert!(!self.read_only);
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for Mmap {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.len);
        }
    }
}
