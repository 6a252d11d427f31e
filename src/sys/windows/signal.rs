use std::sync::{Mutex, Once, OnceLock};

use windows_sys::Win32::Foundation::{HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::System::Console::{
    GenerateConsoleCtrlEvent, SetConsoleCtrlHandler, CTRL_BREAK_EVENT, CTRL_CLOSE_EVENT,
    CTRL_C_EVENT,
};
use windows_sys::Win32::System::Threading::{
    CreateEventW, ResetEvent, SetEvent, WaitForSingleObject, INFINITE,
};

use super::{close_handle, FileHandle};
use crate::{Error, ErrorKind, Result};

// Conventional signal numbers, mirrored from the C runtime.
const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;
const SIGBREAK: i32 = 21;

/// One registration: a console event routed to a manual-reset event.
struct Registration {
    ctrl_type: u32,
    event: HANDLE,
}

// HANDLEs are process-global tokens; the registry mutex is the only
// synchronization they need.
unsafe impl Send for Registration {}

/// The process-wide signal registry. The console control handler is
/// registered exactly once and survives any number of signal streams.
static REGISTRY: OnceLock<Mutex<Vec<Registration>>> = OnceLock::new();

fn registry() -> &'static Mutex<Vec<Registration>> {
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

unsafe extern "system" fn ctrl_handler(ctrl_type: u32) -> i32 {
    let registrations = registry().lock().unwrap();
    let mut handled = 0;
    for registration in registrations.iter() {
        if registration.ctrl_type == ctrl_type {
            unsafe { SetEvent(registration.event) };
            handled = 1;
        }
    }
    handled
}

fn ctrl_type(signo: i32) -> Result<u32> {
    match signo {
        SIGINT => Ok(CTRL_C_EVENT),
        SIGBREAK => Ok(CTRL_BREAK_EVENT),
        SIGTERM => Ok(CTRL_CLOSE_EVENT),
        _ => Err(Error::new(ErrorKind::Unsupported)),
    }
}

/// Creates the stream's event and maps each requested signal to it in the
/// registry.
pub fn open(signals: &[i32]) -> Result<FileHandle> {
    let mut types = Vec::with_capacity(signals.len());
    for signo in signals {
        types.push(ctrl_type(*signo)?);
    }

    let event = unsafe { CreateEventW(std::ptr::null(), 1, 0, std::ptr::null()) };
    if event.is_null() {
        return Err(Error::last_os_error());
    }

    static HANDLER: Once = Once::new();
    let mut handler_error = None;
    HANDLER.call_once(|| {
        if unsafe { SetConsoleCtrlHandler(Some(ctrl_handler), 1) } == 0 {
            handler_error = Some(Error::last_os_error());
        }
    });
    if let Some(err) = handler_error {
        let _ = close_handle(event);
        return Err(err);
    }

    let mut registrations = registry().lock().unwrap();
    for ctrl_type in types {
        registrations.push(Registration { ctrl_type, event });
    }
    Ok(event)
}

/// Waits for the event and resets it for the next delivery. The triggering
/// signal number is not preserved by the control handler.
pub fn read(handle: FileHandle, wait: bool) -> Result<()> {
    let timeout = if wait { INFINITE } else { 0 };
    match unsafe { WaitForSingleObject(handle, timeout) } {
        WAIT_OBJECT_0 => {
            unsafe { ResetEvent(handle) };
            Ok(())
        }
        WAIT_TIMEOUT => Err(Error::new(ErrorKind::WouldBlock)),
        _ => Err(Error::last_os_error()),
    }
}

/// Raises a console signal process-wide. Only Ctrl-C and Ctrl-Break can be
/// generated.
pub fn send(signo: i32) -> Result<()> {
    let ctrl_type = match signo {
        SIGINT => CTRL_C_EVENT,
        SIGBREAK => CTRL_BREAK_EVENT,
        _ => return Err(Error::new(ErrorKind::Unsupported)),
    };
    if unsafe { GenerateConsoleCtrlEvent(ctrl_type, 0) } == 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Drops the stream's registry entries and closes its event.
pub fn close(handle: FileHandle) -> Result<()> {
    let mut registrations = registry().lock().unwrap();
    registrations.retain(|registration| registration.event != handle);
    drop(registrations);
    close_handle(handle)
}
