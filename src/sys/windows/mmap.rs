use std::path::Path;

use windows_sys::Win32::System::Memory as memory;

use super::{close_handle, file};
use crate::stream::StreamFlags;
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
            StreamFlags::READ
        } else {
            StreamFlags::READ | StreamFlags::WRITE
        };
        let handle = file::open(path, flags, 0)?;

        let result = (|| {
            let len = file::size(handle)? as usize;
            if len == 0 {
                return Err(Error::new(ErrorKind::InvalidParam));
            }
            let protect = if read_only {
                memory::PAGE_READONLY
            } else {
                memory::PAGE_READWRITE
            };
            let mapping = unsafe {
                memory::CreateFileMappingW(
                    handle,
                    std::ptr::null(),
                    protect,
                    0,
                    0,
                    std::ptr::null(),
                )
            };
            if mapping.is_null() {
                return Err(Error::last_os_error());
            }

            let access = if read_only {
                memory::FILE_MAP_READ
            } else {
                memory::FILE_MAP_ALL_ACCESS
            };
            let view = unsafe { memory::MapViewOfFile(mapping, access, 0, 0, len) };
            let _ = close_handle(mapping);
            if view.Value.is_null() {
                return Err(Error::last_os_error());
            }
            Ok(Mmap {
                ptr: view.Value as *mut u8,
                len,
                read_only,
            })
        })();

        let _ = file::close(handle);
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

    /// Callers must have checked `read_only` first.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        debug_assert!(!self.read_only);
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for Mmap {
    fn drop(&mut self) {
        unsafe {
            memory::UnmapViewOfFile(memory::MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.ptr as *mut core::ffi::c_void,
            });
        }
    }
}
