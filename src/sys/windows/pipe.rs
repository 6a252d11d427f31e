use windows_sys::Win32::System::Pipes::CreatePipe;

use super::FileHandle;
use crate::{Error, ErrorKind, Result};

/// Creates an anonymous pipe. Anonymous pipes have no non-blocking mode on
/// Windows.
pub fn pipe(nonblocking: bool) -> Result<(FileHandle, FileHandle)> {
    if nonblocking {
        return Err(Error::new(ErrorKind::Unsupported));
    }
    let mut read_end: FileHandle = std::ptr::null_mut();
    let mut write_end: FileHandle = std::ptr::null_mut();
    let ok = unsafe { CreatePipe(&mut read_end, &mut write_end, std::ptr::null(), 0) };
    if ok == 0 {
        Err(Error::last_os_error())
    } else {
        Ok((read_end, write_end))
    }
}
