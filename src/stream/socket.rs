use std::io::{IoSlice, IoSliceMut};

use log::trace;

use crate::stream::{OpFlags, OptionValue, RawHandle, RawStream, StreamFlags, StreamKind, StreamOption};
use crate::sys;
use crate::{Addr, Error, ErrorKind, Family, Result};

/// Socket-backend state for stream sockets, listeners and datagram sockets.
///
/// An unbound datagram client is a *pseudo-socket*: the open address is
/// remembered as the default peer so stream-style writes can map to
/// `sendto`. Connected-stream semantics are never applied to it.
pub(crate) struct SocketStream {
    handle: sys::SocketHandle,
    flags: StreamFlags,
    datagram: bool,
    /// Default destination for pseudo-sockets.
    peer: Option<Addr>,
}

impl SocketStream {
    pub fn open(addr: &Addr, flags: StreamFlags) -> Result<(StreamKind, SocketStream)> {
        let stream_type = flags.contains(StreamFlags::TCP);
        let server = flags.contains(StreamFlags::SERVER);
        let nonblocking = flags.contains(StreamFlags::NONBLOCK);

        let kind = match addr.family() {
            Family::Unix => StreamKind::UnixSocket,
            _ if stream_type => StreamKind::TcpSocket,
            _ => StreamKind::UdpSocket,
        };

        let native = sys::net::to_sockaddr(addr)?;
        let handle = sys::net::open(addr.family(), stream_type, nonblocking)?;

        let result = (|| {
            if server {
                if stream_type {
                    sys::net::set_reuseaddr(handle, true)?;
                }
                sys::net::bind(handle, &native)?;
                if stream_type {
                    sys::net::listen(handle)?;
                }
            } else if stream_type {
                // In-progress non-blocking connects report success; the
                // caller detects completion.
                sys::net::connect(handle, &native)?;
            }
            Ok(())
        })();
        if let Err(err) = result {
            let _ = sys::net::close(handle);
            return Err(err);
        }

        let peer = if !stream_type && !server {
            Some(addr.clone())
        } else {
            None
        };
        trace!("opened {:?} socket stream for {}", kind, addr);

        Ok((
            kind,
            SocketStream {
                handle,
                flags,
                datagram: !stream_type,
                peer,
            },
        ))
    }

    pub fn from_handle(handle: RawHandle, flags: StreamFlags) -> SocketStream {
        SocketStream {
            handle: sys::net::from_raw_handle(handle),
            flags,
            datagram: !flags.contains(StreamFlags::TCP),
            peer: None,
        }
    }

    pub fn accept(&mut self) -> Result<(SocketStream, Addr)> {
        if !self.flags.contains(StreamFlags::SERVER) {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        let handle = self.handle()?;
        let nonblocking = self.flags.contains(StreamFlags::NONBLOCK);
        let (client, addr) = sys::net::accept(handle, nonblocking)?;
        trace!("accepted connection from {}", addr);
        Ok((
            SocketStream {
                handle: client,
                flags: self.flags.difference(StreamFlags::SERVER),
                datagram: self.datagram,
                peer: None,
            },
            addr,
        ))
    }

    pub fn take_error(&self) -> Result<Option<Error>> {
        sys::net::take_error(self.handle()?)
    }

    fn handle(&self) -> Result<sys::SocketHandle> {
        if self.handle == sys::INVALID_SOCKET {
            Err(Error::new(ErrorKind::AlreadyClosed))
        } else {
            Ok(self.handle)
        }
    }

    /// Whether a single call should retry on `EINTR` rather than surface
    /// it.
    fn retry(&self, flags: OpFlags) -> bool {
        !self.flags.contains(StreamFlags::NONBLOCK) && !flags.contains(OpFlags::DONT_WAIT)
    }
}

impl RawStream for SocketStream {
    fn flags(&self) -> StreamFlags {
        self.flags
    }

    fn close(&mut self) -> Result<()> {
        let handle = self.handle()?;
        self.handle = sys::INVALID_SOCKET;
        sys::net::close(handle)
    }

    fn read(&mut self, buf: &mut [u8], flags: OpFlags) -> Result<usize> {
        let handle = self.handle()?;
        let native = sys::net::msg_flags(flags)?;
        let retry = self.retry(flags);

        let n = if self.datagram {
            // The datagram source is discarded; a richer receive is not part
            // of the stream surface.
            sys::net::recv_from(handle, buf, native, retry)?
        } else {
            sys::net::recv(handle, buf, native, retry)?
        };
        if n == 0 && !buf.is_empty() {
            return Err(Error::new(ErrorKind::EndOfStream));
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8], flags: OpFlags) -> Result<usize> {
        let handle = self.handle()?;
        let native = sys::net::msg_flags(flags)?;
        let retry = self.retry(flags);

        match &self.peer {
            Some(peer) => {
                let peer = sys::net::to_sockaddr(peer)?;
                sys::net::send_to(handle, buf, &peer, native, retry)
            }
            None if self.datagram => Err(Error::new(ErrorKind::AddressRequired)),
            None => sys::net::send(handle, buf, native, retry),
        }
    }

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>], flags: OpFlags) -> Result<usize> {
        let handle = self.handle()?;
        let native = sys::net::msg_flags(flags)?;

        if self.datagram {
            // A datagram is one message: stage through a contiguous buffer
            // and scatter afterwards.
            let total: usize = bufs.iter().map(|b| b.len()).sum();
            let mut staging = vec![0u8; total];
            let n = sys::net::recv_from(handle, &mut staging, native, self.retry(flags))?;
            let mut copied = 0;
            for buf in bufs.iter_mut() {
                if copied == n {
                    break;
                }
                let take = buf.len().min(n - copied);
                buf[..take].copy_from_slice(&staging[copied..copied + take]);
                copied += take;
            }
            return Ok(n);
        }

        if native == 0 {
            sys::net::readv(handle, bufs)
        } else {
            sys::net::recvmsg(handle, bufs, native)
        }
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>], flags: OpFlags) -> Result<usize> {
        let handle = self.handle()?;
        let native = sys::net::msg_flags(flags)?;

        if self.datagram {
            let total: usize = bufs.iter().map(|b| b.len()).sum();
            let mut staging = Vec::with_capacity(total);
            for buf in bufs {
                staging.extend_from_slice(buf);
            }
            return match &self.peer {
                Some(peer) => {
                    let peer = sys::net::to_sockaddr(peer)?;
                    sys::net::send_to(handle, &staging, &peer, native, self.retry(flags))
                }
                None => Err(Error::new(ErrorKind::AddressRequired)),
            };
        }

        if native == 0 {
            sys::net::writev(handle, bufs)
        } else {
            sys::net::sendmsg(handle, bufs, native)
        }
    }

    fn get_option(&self, option: StreamOption) -> Result<OptionValue> {
        let handle = self.handle()?;
        match option {
            StreamOption::Handle => Ok(OptionValue::Handle(sys::net::as_raw_handle(handle))),
            StreamOption::Blocking => Ok(OptionValue::Bool(
                // Windows cannot query FIONBIO, so the flag word is the
                // source of truth on every platform.
                !self.flags.contains(StreamFlags::NONBLOCK),
            )),
            StreamOption::NoDelay => sys::net::get_nodelay(handle).map(OptionValue::Bool),
            StreamOption::KeepAlive => sys::net::get_keepalive(handle).map(OptionValue::Bool),
            StreamOption::ReuseAddr => sys::net::get_reuseaddr(handle).map(OptionValue::Bool),
            StreamOption::Broadcast => sys::net::get_broadcast(handle).map(OptionValue::Bool),
            StreamOption::RecvBuffer => {
                sys::net::get_recv_buffer(handle).map(|n| OptionValue::UInt(n as u64))
            }
            StreamOption::SendBuffer => {
                sys::net::get_send_buffer(handle).map(|n| OptionValue::UInt(n as u64))
            }
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }

    fn set_option(&mut self, option: StreamOption, value: OptionValue) -> Result<()> {
        let handle = self.handle()?;
        match option {
            StreamOption::Blocking => {
                let blocking = value.as_bool()?;
                sys::net::set_nonblocking(handle, !blocking)?;
                self.flags.set(StreamFlags::NONBLOCK, !blocking);
                Ok(())
            }
            StreamOption::NoDelay => sys::net::set_nodelay(handle, value.as_bool()?),
            StreamOption::KeepAlive => sys::net::set_keepalive(handle, value.as_bool()?),
            StreamOption::ReuseAddr => sys::net::set_reuseaddr(handle, value.as_bool()?),
            StreamOption::Broadcast => sys::net::set_broadcast(handle, value.as_bool()?),
            StreamOption::RecvBuffer => sys::net::set_recv_buffer(handle, value.as_uint()? as usize),
            StreamOption::SendBuffer => sys::net::set_send_buffer(handle, value.as_uint()? as usize),
            _ => Err(Error::new(ErrorKind::Unsupported)),
        }
    }
}

impl Drop for SocketStream {
    fn drop(&mut self) {
        if self.handle != sys::INVALID_SOCKET {
            let _ = sys::net::close(self.handle);
        }
    }
}
