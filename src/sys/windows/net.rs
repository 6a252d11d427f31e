use std::io::{IoSlice, IoSliceMut};
use std::mem;
use std::net::{SocketAddrV4, SocketAddrV6};
use std::sync::Once;

use windows_sys::Win32::Networking::WinSock as ws;

use super::SocketHandle;
use crate::stream::OpFlags;
use crate::{Addr, Error, ErrorKind, Family, Result};

/// Winsock must be initialised once per process before any socket call.
fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut data = unsafe { mem::zeroed::<ws::WSADATA>() };
        // 2.2 has been the only relevant version for decades; failure here
        // leaves every later call failing with WSANOTINITIALISED.
        unsafe { ws::WSAStartup(0x202, &mut data) };
    });
}

fn last_socket_error() -> Error {
    let code = unsafe { ws::WSAGetLastError() };
    Error::new(ErrorKind::from_raw_os_error(code as u32))
}

/// Native `SOCKADDR` storage paired with its used length.
pub struct SockAddr {
    storage: ws::SOCKADDR_STORAGE,
    len: i32,
}

impl SockAddr {
    pub fn as_ptr(&self) -> *const ws::SOCKADDR {
        &self.storage as *const _ as *const ws::SOCKADDR
    }

    pub fn len(&self) -> i32 {
        self.len
    }
}

pub fn to_sockaddr(addr: &Addr) -> Result<SockAddr> {
    let mut storage = unsafe { mem::zeroed::<ws::SOCKADDR_STORAGE>() };
    let len = match addr {
        Addr::V4(addr) => {
            let sin = unsafe { &mut *(&mut storage as *mut _ as *mut ws::SOCKADDR_IN) };
            sin.sin_family = ws::AF_INET;
            sin.sin_port = addr.port().to_be();
            sin.sin_addr.S_un.S_addr = u32::from_ne_bytes(addr.ip().octets());
            mem::size_of::<ws::SOCKADDR_IN>()
        }
        Addr::V6(addr) => {
            let sin6 = unsafe { &mut *(&mut storage as *mut _ as *mut ws::SOCKADDR_IN6) };
            sin6.sin6_family = ws::AF_INET6;
            sin6.sin6_port = addr.port().to_be();
            sin6.sin6_flowinfo = addr.flowinfo();
            sin6.sin6_addr.u.Byte = addr.ip().octets();
            sin6.Anonymous.sin6_scope_id = addr.scope_id();
            mem::size_of::<ws::SOCKADDR_IN6>()
        }
        // AF_UNIX sockets are not part of the Windows backend.
        Addr::Unix(_) => return Err(Error::new(ErrorKind::Unsupported)),
    };
    Ok(SockAddr {
        storage,
        len: len as i32,
    })
}

pub fn from_sockaddr(storage: &ws::SOCKADDR_STORAGE) -> Result<Addr> {
    match storage.ss_family {
        ws::AF_INET => {
            let sin = unsafe { &*(storage as *const _ as *const ws::SOCKADDR_IN) };
            let ip = unsafe { sin.sin_addr.S_un.S_addr }.to_ne_bytes().into();
            Ok(Addr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
        }
        ws::AF_INET6 => {
            let sin6 = unsafe { &*(storage as *const _ as *const ws::SOCKADDR_IN6) };
            let ip = unsafe { sin6.sin6_addr.u.Byte }.into();
            Ok(Addr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                unsafe { sin6.Anonymous.sin6_scope_id },
            )))
        }
        _ => Err(Error::new(ErrorKind::InvalidAddress)),
    }
}

/// Translates per-call socket flags into native `MSG_*` bits. Windows only
/// has out-of-band and don't-route; everything else is unsupported.
pub fn msg_flags(flags: OpFlags) -> Result<i32> {
    let mut native = 0;
    if flags.contains(OpFlags::OOB) {
        native |= ws::MSG_OOB as i32;
    }
    if flags.contains(OpFlags::DONT_ROUTE) {
        native |= ws::MSG_DONTROUTE as i32;
    }
    if flags.intersects(
        OpFlags::DONT_WAIT
            | OpFlags::CONFIRM
            | OpFlags::MORE
            | OpFlags::NO_SIGNAL
            | OpFlags::END_OF_RECORD
            | OpFlags::FAST_OPEN,
    ) {
        return Err(Error::new(ErrorKind::Unsupported));
    }
    Ok(native)
}

pub fn open(family: Family, stream_type: bool, nonblocking: bool) -> Result<SocketHandle> {
    init();
    let domain = match family {
        Family::Ipv4 => ws::AF_INET,
        Family::Ipv6 => ws::AF_INET6,
        Family::Unix => return Err(Error::new(ErrorKind::Unsupported)),
    };
    let (ty, protocol) = if stream_type {
        (ws::SOCK_STREAM as i32, ws::IPPROTO_TCP)
    } else {
        (ws::SOCK_DGRAM as i32, ws::IPPROTO_UDP)
    };

    let socket = unsafe { ws::socket(domain as i32, ty, protocol) };
    if socket == ws::INVALID_SOCKET {
        return Err(last_socket_error());
    }
    if nonblocking {
        if let Err(err) = set_nonblocking(socket, true) {
            let _ = close(socket);
            return Err(err);
        }
    }
    Ok(socket)
}

pub fn close(socket: SocketHandle) -> Result<()> {
    if unsafe { ws::closesocket(socket) } == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(())
    }
}

pub fn bind(socket: SocketHandle, addr: &SockAddr) -> Result<()> {
    if unsafe { ws::bind(socket, addr.as_ptr(), addr.len()) } == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(())
    }
}

pub fn listen(socket: SocketHandle) -> Result<()> {
    if unsafe { ws::listen(socket, ws::SOMAXCONN as i32) } == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(())
    }
}

pub fn connect(socket: SocketHandle, addr: &SockAddr) -> Result<()> {
    if unsafe { ws::connect(socket, addr.as_ptr(), addr.len()) } == ws::SOCKET_ERROR {
        let err = last_socket_error();
        // Expected for a non-blocking connect; completion is the caller's
        // concern.
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::InProgress => Ok(()),
            _ => Err(err),
        }
    } else {
        Ok(())
    }
}

pub fn accept(socket: SocketHandle, nonblocking: bool) -> Result<(SocketHandle, Addr)> {
    let mut storage = unsafe { mem::zeroed::<ws::SOCKADDR_STORAGE>() };
    let mut len = mem::size_of::<ws::SOCKADDR_STORAGE>() as i32;
    let client = unsafe {
        ws::accept(
            socket,
            &mut storage as *mut _ as *mut ws::SOCKADDR,
            &mut len,
        )
    };
    if client == ws::INVALID_SOCKET {
        return Err(last_socket_error());
    }
    if nonblocking {
        if let Err(err) = set_nonblocking(client, true) {
            let _ = close(client);
            return Err(err);
        }
    }
    let addr = from_sockaddr(&storage)?;
    Ok((client, addr))
}

pub fn set_nonblocking(socket: SocketHandle, nonblocking: bool) -> Result<()> {
    let mut mode: u32 = nonblocking as u32;
    if unsafe { ws::ioctlsocket(socket, ws::FIONBIO, &mut mode) } == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(())
    }
}

pub fn recv(socket: SocketHandle, buf: &mut [u8], flags: i32, _retry: bool) -> Result<usize> {
    let n = unsafe {
        ws::recv(
            socket,
            buf.as_mut_ptr(),
            buf.len().min(i32::MAX as usize) as i32,
            flags,
        )
    };
    if n == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

pub fn send(socket: SocketHandle, buf: &[u8], flags: i32, _retry: bool) -> Result<usize> {
    let n = unsafe {
        ws::send(
            socket,
            buf.as_ptr(),
            buf.len().min(i32::MAX as usize) as i32,
            flags,
        )
    };
    if n == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

pub fn recv_from(socket: SocketHandle, buf: &mut [u8], flags: i32, _retry: bool) -> Result<usize> {
    let mut storage = unsafe { mem::zeroed::<ws::SOCKADDR_STORAGE>() };
    let mut len = mem::size_of::<ws::SOCKADDR_STORAGE>() as i32;
    let n = unsafe {
        ws::recvfrom(
            socket,
            buf.as_mut_ptr(),
            buf.len().min(i32::MAX as usize) as i32,
            flags,
            &mut storage as *mut _ as *mut ws::SOCKADDR,
            &mut len,
        )
    };
    if n == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

pub fn send_to(
    socket: SocketHandle,
    buf: &[u8],
    addr: &SockAddr,
    flags: i32,
    _retry: bool,
) -> Result<usize> {
    let n = unsafe {
        ws::sendto(
            socket,
            buf.as_ptr(),
            buf.len().min(i32::MAX as usize) as i32,
            flags,
            addr.as_ptr(),
            addr.len(),
        )
    };
    if n == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

/// `WSARecv` over the slices; `IoSliceMut` is ABI-compatible with `WSABUF`.
pub fn readv(socket: SocketHandle, bufs: &mut [IoSliceMut<'_>]) -> Result<usize> {
    recvmsg(socket, bufs, 0)
}

pub fn writev(socket: SocketHandle, bufs: &[IoSlice<'_>]) -> Result<usize> {
    sendmsg(socket, bufs, 0)
}

pub fn recvmsg(socket: SocketHandle, bufs: &mut [IoSliceMut<'_>], flags: i32) -> Result<usize> {
    let mut n = 0u32;
    let mut flags = flags as u32;
    let rc = unsafe {
        ws::WSARecv(
            socket,
            bufs.as_mut_ptr() as *mut ws::WSABUF,
            bufs.len().min(u32::MAX as usize) as u32,
            &mut n,
            &mut flags,
            std::ptr::null_mut(),
            None,
        )
    };
    if rc == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

pub fn sendmsg(socket: SocketHandle, bufs: &[IoSlice<'_>], flags: i32) -> Result<usize> {
    let mut n = 0u32;
    let rc = unsafe {
        ws::WSASend(
            socket,
            bufs.as_ptr() as *const ws::WSABUF,
            bufs.len().min(u32::MAX as usize) as u32,
            &mut n,
            flags as u32,
            std::ptr::null_mut(),
            None,
        )
    };
    if rc == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(n as usize)
    }
}

fn set_opt_int(socket: SocketHandle, level: i32, name: i32, value: i32) -> Result<()> {
    let rc = unsafe {
        ws::setsockopt(
            socket,
            level,
            name,
            &value as *const _ as *const u8,
            mem::size_of::<i32>() as i32,
        )
    };
    if rc == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(())
    }
}

fn get_opt_int(socket: SocketHandle, level: i32, name: i32) -> Result<i32> {
    let mut value: i32 = 0;
    let mut len = mem::size_of::<i32>() as i32;
    let rc = unsafe {
        ws::getsockopt(
            socket,
            level,
            name,
            &mut value as *mut _ as *mut u8,
            &mut len,
        )
    };
    if rc == ws::SOCKET_ERROR {
        Err(last_socket_error())
    } else {
        Ok(value)
    }
}

pub fn get_nodelay(socket: SocketHandle) -> Result<bool> {
    get_opt_int(socket, ws::IPPROTO_TCP, ws::TCP_NODELAY as i32).map(|v| v != 0)
}

pub fn set_nodelay(socket: SocketHandle, nodelay: bool) -> Result<()> {
    set_opt_int(socket, ws::IPPROTO_TCP, ws::TCP_NODELAY as i32, nodelay as i32)
}

pub fn get_keepalive(socket: SocketHandle) -> Result<bool> {
    get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_KEEPALIVE as i32).map(|v| v != 0)
}

pub fn set_keepalive(socket: SocketHandle, keepalive: bool) -> Result<()> {
    set_opt_int(
        socket,
        ws::SOL_SOCKET as i32,
        ws::SO_KEEPALIVE as i32,
        keepalive as i32,
    )
}

pub fn get_reuseaddr(socket: SocketHandle) -> Result<bool> {
    get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_REUSEADDR as i32).map(|v| v != 0)
}

pub fn set_reuseaddr(socket: SocketHandle, reuse: bool) -> Result<()> {
    set_opt_int(
        socket,
        ws::SOL_SOCKET as i32,
        ws::SO_REUSEADDR as i32,
        reuse as i32,
    )
}

pub fn get_broadcast(socket: SocketHandle) -> Result<bool> {
    get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_BROADCAST as i32).map(|v| v != 0)
}

pub fn set_broadcast(socket: SocketHandle, broadcast: bool) -> Result<()> {
    set_opt_int(
        socket,
        ws::SOL_SOCKET as i32,
        ws::SO_BROADCAST as i32,
        broadcast as i32,
    )
}

pub fn get_recv_buffer(socket: SocketHandle) -> Result<usize> {
    get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_RCVBUF as i32).map(|v| v as usize)
}

pub fn set_recv_buffer(socket: SocketHandle, bytes: usize) -> Result<()> {
    set_opt_int(
        socket,
        ws::SOL_SOCKET as i32,
        ws::SO_RCVBUF as i32,
        bytes as i32,
    )
}

pub fn get_send_buffer(socket: SocketHandle) -> Result<usize> {
    get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_SNDBUF as i32).map(|v| v as usize)
}

pub fn set_send_buffer(socket: SocketHandle, bytes: usize) -> Result<()> {
    set_opt_int(
        socket,
        ws::SOL_SOCKET as i32,
        ws::SO_SNDBUF as i32,
        bytes as i32,
    )
}

pub fn take_error(socket: SocketHandle) -> Result<Option<Error>> {
    let code = get_opt_int(socket, ws::SOL_SOCKET as i32, ws::SO_ERROR as i32)?;
    if code == 0 {
        Ok(None)
    } else {
        Ok(Some(Error::new(ErrorKind::from_raw_os_error(code as u32))))
    }
}

pub fn from_raw_handle(handle: crate::stream::RawHandle) -> SocketHandle {
    handle as SocketHandle
}

pub fn as_raw_handle(socket: SocketHandle) -> crate::stream::RawHandle {
    socket as crate::stream::RawHandle
}
