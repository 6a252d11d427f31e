use std::os::unix::io::RawFd;

use crate::Result;

/// Creates an anonymous pipe, returning `(read, write)` descriptors. Both
/// ends are close-on-exec; `nonblocking` applies to both.
pub fn pipe(nonblocking: bool) -> Result<(RawFd, RawFd)> {
    let mut fds: [RawFd; 2] = [-1, -1];

    #[cfg(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    {
        let mut flags = libc::O_CLOEXEC;
        if nonblocking {
            flags |= libc::O_NONBLOCK;
        }
        syscall!(pipe2(fds.as_mut_ptr(), flags))?;
    }

    // Platforms without `pipe2` race between creation and fcntl; nothing
    // better is available there.
    #[cfg(not(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd"
    )))]
    {
        syscall!(pipe(fds.as_mut_ptr()))?;
        for fd in fds {
            if let Err(err) = crate::sys::set_cloexec(fd, true).and_then(|()| {
                if nonblocking {
                    crate::sys::set_nonblocking(fd, true)
                } else {
                    Ok(())
                }
            }) {
                let _ = crate::sys::close(fds[0]);
                let _ = crate::sys::close(fds[1]);
                return Err(err);
            }
        }
    }

    Ok((fds[0], fds[1]))
}
