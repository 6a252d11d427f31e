pub mod file;
pub mod mmap;
pub mod net;
pub mod pipe;
pub mod signal;
pub mod timer;

pub use self::mmap::Mmap;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};

use crate::{Error, Result};

/// Native file (and pipe, terminal, timer, signal) handle.
pub type FileHandle = HANDLE;
/// Native socket handle.
pub type SocketHandle = windows_sys::Win32::Networking::WinSock::SOCKET;

/// Sentinel stored once a handle has been closed.
pub const INVALID_FILE: FileHandle = INVALID_HANDLE_VALUE;
/// Sentinel stored once a socket has been closed.
pub const INVALID_SOCKET: SocketHandle =
    windows_sys::Win32::Networking::WinSock::INVALID_SOCKET;

pub(crate) fn close_handle(handle: HANDLE) -> Result<()> {
    if unsafe { CloseHandle(handle) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}
