use std::io::{IoSlice, IoSliceMut};
use std::mem;
use std::net::{SocketAddrV4, SocketAddrV6};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::PathBuf;

use crate::stream::OpFlags;
use crate::{Addr, Error, ErrorKind, Family, Result};

/// Native `sockaddr` storage paired with its used length.
pub struct SockAddr {
    storage: libc::sockaddr_storage,
    len: libc::socklen_t,
}

impl SockAddr {
    pub fn as_ptr(&self) -> *const libc::sockaddr {
        &self.storage as *const _ as *const libc::sockaddr
    }

    pub fn len(&self) -> libc::socklen_t {
        self.len
    }
}

/// Converts an [`Addr`] into native `sockaddr` storage.
pub fn to_sockaddr(addr: &Addr) -> Result<SockAddr> {
    let mut storage = unsafe { mem::zeroed::<libc::sockaddr_storage>() };
    let len = match addr {
        Addr::V4(addr) => {
            let sin = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in) };
            sin.sin_family = libc::AF_INET as libc::sa_family_t;
            sin.sin_port = addr.port().to_be();
            sin.sin_addr = libc::in_addr {
                s_addr: u32::from_ne_bytes(addr.ip().octets()),
            };
            mem::size_of::<libc::sockaddr_in>()
        }
        Addr::V6(addr) => {
            let sin6 = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in6) };
            sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            sin6.sin6_port = addr.port().to_be();
            sin6.sin6_flowinfo = addr.flowinfo();
            sin6.sin6_addr.s6_addr = addr.ip().octets();
            sin6.sin6_scope_id = addr.scope_id();
            mem::size_of::<libc::sockaddr_in6>()
        }
        Addr::Unix(path) => {
            let sun = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_un) };
            sun.sun_family = libc::AF_UNIX as libc::sa_family_t;
            let bytes = path.as_os_str().as_bytes();
            if bytes.contains(&0) || bytes.len() >= sun.sun_path.len() {
                return Err(Error::new(ErrorKind::NameTooLong));
            }
            for (dst, src) in sun.sun_path.iter_mut().zip(bytes) {
                *dst = *src as libc::c_char;
            }
            let path_offset = {
                let base = sun as *const _ as usize;
                let path = &sun.sun_path as *const _ as usize;
                path - base
            };
            path_offset + bytes.len() + 1
        }
    };
    Ok(SockAddr {
        storage,
        len: len as libc::socklen_t,
    })
}

/// Converts native `sockaddr` storage back into an [`Addr`].
pub fn from_sockaddr(storage: &libc::sockaddr_storage) -> Result<Addr> {
    match storage.ss_family as libc::c_int {
        libc::AF_INET => {
            let sin = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
            let ip = sin.sin_addr.s_addr.to_ne_bytes().into();
            Ok(Addr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
        }
        libc::AF_INET6 => {
            let sin6 = unsafe { &*(storage as *const _ as *const libc::sockaddr_in6) };
            let ip = sin6.sin6_addr.s6_addr.into();
            Ok(Addr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            )))
        }
        libc::AF_UNIX => {
            let sun = unsafe { &*(storage as *const _ as *const libc::sockaddr_un) };
            let bytes: Vec<u8> = sun
                .sun_path
                .iter()
                .take_while(|c| **c != 0)
                .map(|c| *c as u8)
                .collect();
            use std::ffi::OsString;
            use std::os::unix::ffi::OsStringExt;
            Ok(Addr::Unix(PathBuf::from(OsString::from_vec(bytes))))
        }
        _ => Err(Error::new(ErrorKind::InvalidAddress)),
    }
}

/// Translates per-call socket flags into native `MSG_*` bits.
///
/// Flags the platform has no bit for yield [`ErrorKind::Unsupported`].
pub fn msg_flags(flags: OpFlags) -> Result<libc::c_int> {
    let mut native = 0;
    if flags.contains(OpFlags::DONT_WAIT) {
        native |= libc::MSG_DONTWAIT;
    }
    if flags.contains(OpFlags::DONT_ROUTE) {
        native |= libc::MSG_DONTROUTE;
    }
    if flags.contains(OpFlags::OOB) {
        native |= libc::MSG_OOB;
    }
    if flags.contains(OpFlags::END_OF_RECORD) {
        native |= libc::MSG_EOR;
    }
    if flags.contains(OpFlags::NO_SIGNAL) {
        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        {
            native |= libc::MSG_NOSIGNAL;
        }
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        return Err(Error::new(ErrorKind::Unsupported));
    }
    if flags.contains(OpFlags::CONFIRM) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            native |= libc::MSG_CONFIRM;
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        return Err(Error::new(ErrorKind::Unsupported));
    }
    if flags.contains(OpFlags::MORE) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            native |= libc::MSG_MORE;
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        return Err(Error::new(ErrorKind::Unsupported));
    }
    if flags.contains(OpFlags::FAST_OPEN) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            native |= libc::MSG_FASTOPEN;
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        return Err(Error::new(ErrorKind::Unsupported));
    }
    Ok(native)
}

/// Creates a socket, applying non-blocking and close-on-exec atomically
/// where the platform allows it.
pub fn socket(
    domain: libc::c_int,
    ty: libc::c_int,
    protocol: libc::c_int,
    nonblocking: bool,
) -> Result<RawFd> {
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
        let mut ty = ty | libc::SOCK_CLOEXEC;
        if nonblocking {
            ty |= libc::SOCK_NONBLOCK;
        }
        syscall!(socket(domain, ty, protocol))
    }

    // Platforms without `SOCK_NONBLOCK`/`SOCK_CLOEXEC` fall back to fcntl.
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
        let fd = syscall!(socket(domain, ty, protocol))?;
        if let Err(err) = crate::sys::set_cloexec(fd, true)
            .and_then(|()| if nonblocking { crate::sys::set_nonblocking(fd, true) } else { Ok(()) })
        {
            let _ = crate::sys::close(fd);
            return Err(err);
        }
        Ok(fd)
    }
}

pub fn bind(fd: RawFd, addr: &SockAddr) -> Result<()> {
    syscall!(bind(fd, addr.as_ptr(), addr.len())).map(drop)
}

pub fn listen(fd: RawFd) -> Result<()> {
    syscall!(listen(fd, libc::SOMAXCONN)).map(drop)
}

/// Initiates a connection. A non-blocking connect still in progress is
/// reported as success; completion detection is the caller's concern.
pub fn connect(fd: RawFd, addr: &SockAddr) -> Result<()> {
    match syscall!(connect(fd, addr.as_ptr(), addr.len())) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::InProgress => Ok(()),
        Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
        Err(err) => Err(err),
    }
}

/// Accepts a connection, returning the client descriptor and address. The
/// client inherits close-on-exec and, when requested, non-blocking mode.
pub fn accept(fd: RawFd, nonblocking: bool) -> Result<(RawFd, Addr)> {
    let mut storage = unsafe { mem::zeroed::<libc::sockaddr_storage>() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let addr_ptr = &mut storage as *mut _ as *mut libc::sockaddr;

    #[cfg(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    let client = {
        let mut flags = libc::SOCK_CLOEXEC;
        if nonblocking {
            flags |= libc::SOCK_NONBLOCK;
        }
        syscall!(accept4(fd, addr_ptr, &mut len, flags))?
    };

    #[cfg(not(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "illumos",
        target_os = "linux",
        target_os = "netbsd",
        target_os = "openbsd"
    )))]
    let client = {
        let client = syscall!(accept(fd, addr_ptr, &mut len))?;
        if let Err(err) = crate::sys::set_cloexec(client, true).and_then(|()| {
            if nonblocking {
                crate::sys::set_nonblocking(client, true)
            } else {
                Ok(())
            }
        }) {
            let _ = crate::sys::close(client);
            return Err(err);
        }
        client
    };

    let addr = from_sockaddr(&storage)?;
    Ok((client, addr))
}

/// Single `recv`, retrying `EINTR` when `retry` is set.
pub fn recv(fd: RawFd, buf: &mut [u8], flags: libc::c_int, retry: bool) -> Result<usize> {
    loop {
        match syscall!(recv(
            fd,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            flags,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Single `send`, retrying `EINTR` when `retry` is set.
pub fn send(fd: RawFd, buf: &[u8], flags: libc::c_int, retry: bool) -> Result<usize> {
    loop {
        match syscall!(send(
            fd,
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            flags,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// `recvfrom` that discards the source address.
pub fn recv_from(fd: RawFd, buf: &mut [u8], flags: libc::c_int, retry: bool) -> Result<usize> {
    let mut storage = unsafe { mem::zeroed::<libc::sockaddr_storage>() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    loop {
        match syscall!(recvfrom(
            fd,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            flags,
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut len,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

pub fn send_to(
    fd: RawFd,
    buf: &[u8],
    addr: &SockAddr,
    flags: libc::c_int,
    retry: bool,
) -> Result<usize> {
    loop {
        match syscall!(sendto(
            fd,
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            flags,
            addr.as_ptr(),
            addr.len(),
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if retry && err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Plain `readv(2)`. `IoSliceMut` is ABI-compatible with `iovec`.
pub fn readv(fd: RawFd, bufs: &mut [IoSliceMut<'_>]) -> Result<usize> {
    loop {
        match syscall!(readv(
            fd,
            bufs.as_mut_ptr() as *mut libc::iovec,
            bufs.len().min(libc::c_int::MAX as usize) as libc::c_int,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Plain `writev(2)`.
pub fn writev(fd: RawFd, bufs: &[IoSlice<'_>]) -> Result<usize> {
    loop {
        match syscall!(writev(
            fd,
            bufs.as_ptr() as *const libc::iovec,
            bufs.len().min(libc::c_int::MAX as usize) as libc::c_int,
        )) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// `recvmsg` carrying per-call socket flags that `readv` cannot convey.
pub fn recvmsg(fd: RawFd, bufs: &mut [IoSliceMut<'_>], flags: libc::c_int) -> Result<usize> {
    let mut msg = unsafe { mem::zeroed::<libc::msghdr>() };
    msg.msg_iov = bufs.as_mut_ptr() as *mut libc::iovec;
    msg.msg_iovlen = bufs.len() as _;
    loop {
        match syscall!(recvmsg(fd, &mut msg, flags)) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// `sendmsg` carrying per-call socket flags that `writev` cannot convey.
pub fn sendmsg(fd: RawFd, bufs: &[IoSlice<'_>], flags: libc::c_int) -> Result<usize> {
    let mut msg = unsafe { mem::zeroed::<libc::msghdr>() };
    msg.msg_iov = bufs.as_ptr() as *mut libc::iovec;
    msg.msg_iovlen = bufs.len() as _;
    loop {
        match syscall!(sendmsg(fd, &msg, flags)) {
            Ok(n) => return Ok(n as usize),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

pub fn set_opt_int(
    fd: RawFd,
    level: libc::c_int,
    name: libc::c_int,
    value: libc::c_int,
) -> Result<()> {
    syscall!(setsockopt(
        fd,
        level,
        name,
        &value as *const _ as *const libc::c_void,
        mem::size_of::<libc::c_int>() as libc::socklen_t,
    ))
    .map(drop)
}

pub fn get_opt_int(fd: RawFd, level: libc::c_int, name: libc::c_int) -> Result<libc::c_int> {
    let mut value: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    syscall!(getsockopt(
        fd,
        level,
        name,
        &mut value as *mut _ as *mut libc::c_void,
        &mut len,
    ))?;
    Ok(value)
}

/// Fetches and clears the socket's pending error (`SO_ERROR`).
pub fn take_error(fd: RawFd) -> Result<Option<Error>> {
    let code = get_opt_int(fd, libc::SOL_SOCKET, libc::SO_ERROR)?;
    if code == 0 {
        Ok(None)
    } else {
        Ok(Some(Error::new(ErrorKind::from_raw_os_error(code))))
    }
}

/// Creates a socket for the address family, choosing stream or datagram
/// semantics and the matching IP protocol.
pub fn open(family: Family, stream_type: bool, nonblocking: bool) -> Result<RawFd> {
    let domain = match family {
        Family::Ipv4 => libc::AF_INET,
        Family::Ipv6 => libc::AF_INET6,
        Family::Unix => libc::AF_UNIX,
    };
    let ty = if stream_type {
        libc::SOCK_STREAM
    } else {
        libc::SOCK_DGRAM
    };
    let protocol = match family {
        Family::Unix => 0,
        _ if stream_type => libc::IPPROTO_TCP,
        _ => libc::IPPROTO_UDP,
    };
    socket(domain, ty, protocol, nonblocking)
}

pub fn close(fd: RawFd) -> Result<()> {
    crate::sys::close(fd)
}

pub fn from_raw_handle(handle: crate::stream::RawHandle) -> RawFd {
    handle
}

pub fn as_raw_handle(fd: RawFd) -> crate::stream::RawHandle {
    fd
}

pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<()> {
    crate::sys::set_nonblocking(fd, nonblocking)
}

pub fn get_nodelay(fd: RawFd) -> Result<bool> {
    get_opt_int(fd, libc::IPPROTO_TCP, libc::TCP_NODELAY).map(|v| v != 0)
}

pub fn set_nodelay(fd: RawFd, nodelay: bool) -> Result<()> {
    set_opt_int(fd, libc::IPPROTO_TCP, libc::TCP_NODELAY, nodelay as libc::c_int)
}

pub fn get_keepalive(fd: RawFd) -> Result<bool> {
    get_opt_int(fd, libc::SOL_SOCKET, libc::SO_KEEPALIVE).map(|v| v != 0)
}

pub fn set_keepalive(fd: RawFd, keepalive: bool) -> Result<()> {
    set_opt_int(fd, libc::SOL_SOCKET, libc::SO_KEEPALIVE, keepalive as libc::c_int)
}

pub fn get_reuseaddr(fd: RawFd) -> Result<bool> {
    get_opt_int(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR).map(|v| v != 0)
}

pub fn set_reuseaddr(fd: RawFd, reuse: bool) -> Result<()> {
    set_opt_int(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, reuse as libc::c_int)
}

pub fn get_broadcast(fd: RawFd) -> Result<bool> {
    get_opt_int(fd, libc::SOL_SOCKET, libc::SO_BROADCAST).map(|v| v != 0)
}

pub fn set_broadcast(fd: RawFd, broadcast: bool) -> Result<()> {
    set_opt_int(fd, libc::SOL_SOCKET, libc::SO_BROADCAST, broadcast as libc::c_int)
}

pub fn get_recv_buffer(fd: RawFd) -> Result<usize> {
    get_opt_int(fd, libc::SOL_SOCKET, libc::SO_RCVBUF).map(|v| v as usize)
}

pub fn set_recv_buffer(fd: RawFd, bytes: usize) -> Result<()> {
    set_opt_int(fd, libc::SOL_SOCKET, libc::SO_RCVBUF, bytes as libc::c_int)
}

pub fn get_send_buffer(fd: RawFd) -> Result<usize> {
    get_opt_int(fd, libc::SOL_SOCKET, libc::SO_SNDBUF).map(|v| v as usize)
}

pub fn set_send_buffer(fd: RawFd, bytes: usize) -> Result<()> {
    set_opt_int(fd, libc::SOL_SOCKET, libc::SO_SNDBUF, bytes as libc::c_int)
}
