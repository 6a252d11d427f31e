use std::io::SeekFrom;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows_sys::Win32::Foundation::{
    GENERIC_READ, GENERIC_WRITE, ERROR_HANDLE_EOF,
};
use windows_sys::Win32::Storage::FileSystem as fs;
use windows_sys::Win32::System::Console::{
    GetStdHandle, STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows_sys::Win32::System::IO::OVERLAPPED;

use super::{close_handle, FileHandle, INVALID_FILE};
use crate::stream::StreamFlags;
use crate::{Error, ErrorKind, Result};

fn wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str().encode_wide().chain(Some(0)).collect()
}

/// Translates the portable flag set into `CreateFileW` access, disposition
/// and attribute words and opens the file.
pub fn open(path: &Path, flags: StreamFlags, _mode: u32) -> Result<FileHandle> {
    // There is no non-blocking mode for Windows file handles.
    if flags.contains(StreamFlags::NONBLOCK) {
        return Err(Error::new(ErrorKind::Unsupported));
    }

    let mut access = 0;
    if flags.contains(StreamFlags::READ) {
        access |= GENERIC_READ;
    }
    if flags.contains(StreamFlags::WRITE) {
        access |= GENERIC_WRITE;
    }

    let disposition = match (
        flags.contains(StreamFlags::CREATE),
        flags.contains(StreamFlags::EXCL),
        flags.contains(StreamFlags::TRUNC),
    ) {
        (true, true, _) => fs::CREATE_NEW,
        (true, _, true) => fs::CREATE_ALWAYS,
        (true, false, false) => fs::OPEN_ALWAYS,
        (false, _, true) => fs::TRUNCATE_EXISTING,
        _ => fs::OPEN_EXISTING,
    };

    let mut attributes = fs::FILE_ATTRIBUTE_NORMAL;
    if flags.contains(StreamFlags::SYNC) {
        attributes |= fs::FILE_FLAG_WRITE_THROUGH;
    }
    if flags.contains(StreamFlags::DIRECT) {
        attributes |= fs::FILE_FLAG_NO_BUFFERING;
    }
    if flags.contains(StreamFlags::ASYNC) {
        attributes |= fs::FILE_FLAG_OVERLAPPED;
    }
    if flags.contains(StreamFlags::TEMP) {
        attributes |= fs::FILE_ATTRIBUTE_TEMPORARY;
    }

    let path = wide_path(path);
    let handle = unsafe {
        fs::CreateFileW(
            path.as_ptr(),
            access,
            fs::FILE_SHARE_READ,
            std::ptr::null(),
            disposition,
            attributes,
            std::ptr::null_mut(),
        )
    };
    if handle == INVALID_FILE {
        Err(Error::last_os_error())
    } else {
        Ok(handle)
    }
}

pub fn close(handle: FileHandle) -> Result<()> {
    close_handle(handle)
}

pub fn read(handle: FileHandle, buf: &mut [u8], _retry: bool) -> Result<usize> {
    let mut n = 0u32;
    let ok = unsafe {
        fs::ReadFile(
            handle,
            buf.as_mut_ptr(),
            buf.len().min(u32::MAX as usize) as u32,
            &mut n,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        let err = Error::last_os_error();
        // A synchronous read past the end is a plain zero-count read.
        if err.kind() == ErrorKind::EndOfStream {
            return Ok(0);
        }
        return Err(err);
    }
    Ok(n as usize)
}

pub fn write(handle: FileHandle, buf: &[u8], _retry: bool) -> Result<usize> {
    let mut n = 0u32;
    let ok = unsafe {
        fs::WriteFile(
            handle,
            buf.as_ptr(),
            buf.len().min(u32::MAX as usize) as u32,
            &mut n,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

fn overlapped_at(offset: u64) -> OVERLAPPED {
    let mut overlapped = unsafe { std::mem::zeroed::<OVERLAPPED>() };
    overlapped.Anonymous.Anonymous.Offset = offset as u32;
    overlapped.Anonymous.Anonymous.OffsetHigh = (offset >> 32) as u32;
    overlapped
}

pub fn read_at(handle: FileHandle, buf: &mut [u8], offset: u64) -> Result<usize> {
    let mut overlapped = overlapped_at(offset);
    let mut n = 0u32;
    let ok = unsafe {
        fs::ReadFile(
            handle,
            buf.as_mut_ptr(),
            buf.len().min(u32::MAX as usize) as u32,
            &mut n,
            &mut overlapped,
        )
    };
    if ok == 0 {
        let raw = unsafe { windows_sys::Win32::Foundation::GetLastError() };
        if raw == ERROR_HANDLE_EOF {
            return Ok(0);
        }
        return Err(Error::new(ErrorKind::from_raw_os_error(raw)));
    }
    Ok(n as usize)
}

pub fn write_at(handle: FileHandle, buf: &[u8], offset: u64) -> Result<usize> {
    let mut overlapped = overlapped_at(offset);
    let mut n = 0u32;
    let ok = unsafe {
        fs::WriteFile(
            handle,
            buf.as_ptr(),
            buf.len().min(u32::MAX as usize) as u32,
            &mut n,
            &mut overlapped,
        )
    };
    if ok == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

pub fn seek(handle: FileHandle, pos: SeekFrom) -> Result<u64> {
    let (method, offset) = match pos {
        SeekFrom::Start(offset) => (fs::FILE_BEGIN, offset as i64),
        SeekFrom::Current(offset) => (fs::FILE_CURRENT, offset),
        SeekFrom::End(offset) => (fs::FILE_END, offset),
    };
    let mut new_pos = 0i64;
    let ok = unsafe { fs::SetFilePointerEx(handle, offset, &mut new_pos, method) };
    if ok == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(new_pos as u64)
    }
}

/// `SetEndOfFile` truncates at the current position, so the position is
/// saved and restored around it.
pub fn truncate(handle: FileHandle, size: u64) -> Result<()> {
    let saved = seek(handle, SeekFrom::Current(0))?;
    seek(handle, SeekFrom::Start(size))?;
    let result = if unsafe { fs::SetEndOfFile(handle) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    };
    let restore = seek(handle, SeekFrom::Start(saved.min(size)));
    result.and(restore.map(drop))
}

pub fn sync(handle: FileHandle) -> Result<()> {
    if unsafe { fs::FlushFileBuffers(handle) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

pub fn size(handle: FileHandle) -> Result<u64> {
    let mut size = 0i64;
    if unsafe { fs::GetFileSizeEx(handle, &mut size) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(size as u64)
    }
}

/// `LockFileEx` over the byte range; `len == 0` locks to end of file.
pub fn lock(handle: FileHandle, offset: u64, len: u64, exclusive: bool, wait: bool) -> Result<()> {
    let mut flags = 0;
    if exclusive {
        flags |= fs::LOCKFILE_EXCLUSIVE_LOCK;
    }
    if !wait {
        flags |= fs::LOCKFILE_FAIL_IMMEDIATELY;
    }
    let (low, high) = lock_len(len);
    let mut overlapped = overlapped_at(offset);
    if unsafe { fs::LockFileEx(handle, flags, 0, low, high, &mut overlapped) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

pub fn unlock(handle: FileHandle, offset: u64, len: u64) -> Result<()> {
    let (low, high) = lock_len(len);
    let mut overlapped = overlapped_at(offset);
    if unsafe { fs::UnlockFileEx(handle, 0, low, high, &mut overlapped) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

fn lock_len(len: u64) -> (u32, u32) {
    if len == 0 {
        // Largest possible range stands in for "to end of file".
        (u32::MAX, u32::MAX)
    } else {
        (len as u32, (len >> 32) as u32)
    }
}

pub fn from_raw_handle(handle: crate::stream::RawHandle) -> FileHandle {
    handle as FileHandle
}

pub fn as_raw_handle(handle: FileHandle) -> crate::stream::RawHandle {
    handle as crate::stream::RawHandle
}

pub fn stdin_handle() -> FileHandle {
    unsafe { GetStdHandle(STD_INPUT_HANDLE) }
}

pub fn stdout_handle() -> FileHandle {
    unsafe { GetStdHandle(STD_OUTPUT_HANDLE) }
}

pub fn stderr_handle() -> FileHandle {
    unsafe { GetStdHandle(STD_ERROR_HANDLE) }
}

/// Console pseudo-device.
pub const TERMINAL_DEVICE: &str = "CON";
