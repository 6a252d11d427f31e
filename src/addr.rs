//! Uniform socket addresses.
//!
//! [`Addr`] carries an IPv4, IPv6 or Unix-domain endpoint as a plain value.
//! IPv4 and IPv6 addresses round-trip through their text form, and the
//! loopback / wildcard constructors never touch the kernel. The socket
//! backend converts an `Addr` to native `sockaddr` storage at the syscall
//! boundary.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bitflags::bitflags;

use crate::{Error, ErrorKind, Result};

/// The address family of an [`Addr`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
    /// Unix-domain (filesystem path).
    Unix,
}

bitflags! {
    /// Field mask for [`Addr::eq_masked`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct AddrCmp: u32 {
        /// Compare the address family.
        const FAMILY = 1 << 0;
        /// Compare the numeric address (or path).
        const IP = 1 << 1;
        /// Compare the port.
        const PORT = 1 << 2;
    }
}

/// A socket address: IPv4, IPv6, or a Unix-domain path.
///
/// Unix-domain values can be constructed on every platform; opening a socket
/// with one is only supported on Unix.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Addr {
    /// An IPv4 endpoint.
    V4(SocketAddrV4),
    /// An IPv6 endpoint.
    V6(SocketAddrV6),
    /// A Unix-domain endpoint.
    Unix(PathBuf),
}

impl Addr {
    /// Creates a Unix-domain address from a filesystem path.
    pub fn unix<P: AsRef<Path>>(path: P) -> Addr {
        Addr::Unix(path.as_ref().to_path_buf())
    }

    /// Returns the loopback address of `family` with the given port.
    ///
    /// Fails with [`ErrorKind::InvalidParam`] for [`Family::Unix`], which has
    /// no loopback notion.
    pub fn loopback(family: Family, port: u16) -> Result<Addr> {
        match family {
            Family::Ipv4 => Ok(Addr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))),
            Family::Ipv6 => Ok(Addr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, port, 0, 0))),
            Family::Unix => Err(Error::new(ErrorKind::InvalidParam)),
        }
    }

    /// Returns the wildcard ("any") address of `family` with the given port.
    ///
    /// Fails with [`ErrorKind::InvalidParam`] for [`Family::Unix`].
    pub fn any(family: Family, port: u16) -> Result<Addr> {
        match family {
            Family::Ipv4 => Ok(Addr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))),
            Family::Ipv6 => Ok(Addr::V6(SocketAddrV6::new(
                Ipv6Addr::UNSPECIFIED,
                port,
                0,
                0,
            ))),
            Family::Unix => Err(Error::new(ErrorKind::InvalidParam)),
        }
    }

    /// Returns this address's family.
    pub fn family(&self) -> Family {
        match self {
            Addr::V4(_) => Family::Ipv4,
            Addr::V6(_) => Family::Ipv6,
            Addr::Unix(_) => Family::Unix,
        }
    }

    /// Returns the port, or 0 for Unix-domain addresses.
    pub fn port(&self) -> u16 {
        match self {
            Addr::V4(a) => a.port(),
            Addr::V6(a) => a.port(),
            Addr::Unix(_) => 0,
        }
    }

    /// Sets the port. No-op for Unix-domain addresses.
    pub fn set_port(&mut self, port: u16) {
        match self {
            Addr::V4(a) => a.set_port(port),
            Addr::V6(a) => a.set_port(port),
            Addr::Unix(_) => {}
        }
    }

    /// Returns the IP, or `None` for Unix-domain addresses.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Addr::V4(a) => Some(IpAddr::V4(*a.ip())),
            Addr::V6(a) => Some(IpAddr::V6(*a.ip())),
            Addr::Unix(_) => None,
        }
    }

    /// Returns the path of a Unix-domain address.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Addr::Unix(p) => Some(p),
            _ => None,
        }
    }

    /// True if this is a loopback address. Unix-domain addresses are never
    /// loopback.
    pub fn is_loopback(&self) -> bool {
        match self {
            Addr::V4(a) => a.ip().is_loopback(),
            Addr::V6(a) => a.ip().is_loopback(),
            Addr::Unix(_) => false,
        }
    }

    /// True if this is a multicast address.
    pub fn is_multicast(&self) -> bool {
        match self {
            Addr::V4(a) => a.ip().is_multicast(),
            Addr::V6(a) => a.ip().is_multicast(),
            Addr::Unix(_) => false,
        }
    }

    /// Compares the fields selected by `mask`, independently of the others.
    ///
    /// With [`AddrCmp::IP`] but not [`AddrCmp::FAMILY`], addresses of
    /// different families compare unequal (there is no cross-family numeric
    /// comparison). The path plays the role of the IP for Unix-domain
    /// addresses.
    pub fn eq_masked(&self, other: &Addr, mask: AddrCmp) -> bool {
        if mask.contains(AddrCmp::FAMILY) && self.family() != other.family() {
            return false;
        }
        if mask.contains(AddrCmp::IP) {
            let same_ip = match (self, other) {
                (Addr::V4(a), Addr::V4(b)) => a.ip() == b.ip(),
                (Addr::V6(a), Addr::V6(b)) => a.ip() == b.ip(),
                (Addr::Unix(a), Addr::Unix(b)) => a == b,
                _ => false,
            };
            if !same_ip {
                return false;
            }
        }
        if mask.contains(AddrCmp::PORT) && self.port() != other.port() {
            return false;
        }
        true
    }
}

impl FromStr for Addr {
    type Err = Error;

    /// Parses `"host:port"` or `"[v6-host]:port"`.
    ///
    /// Unix-domain addresses are not parseable from text; build them with
    /// [`Addr::unix`].
    fn from_str(s: &str) -> Result<Addr> {
        match SocketAddr::from_str(s) {
            Ok(SocketAddr::V4(a)) => Ok(Addr::V4(a)),
            Ok(SocketAddr::V6(a)) => Ok(Addr::V6(a)),
            Err(_) => Err(Error::new(ErrorKind::InvalidAddress)),
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::V4(a) => a.fmt(f),
            Addr::V6(a) => a.fmt(f),
            Addr::Unix(p) => p.display().fmt(f),
        }
    }
}

impl From<SocketAddr> for Addr {
    fn from(addr: SocketAddr) -> Addr {
        match addr {
            SocketAddr::V4(a) => Addr::V4(a),
            SocketAddr::V6(a) => Addr::V6(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        for text in ["127.0.0.1:9877", "0.0.0.0:0", "[::1]:80", "[2001:db8::7]:443"] {
            let addr: Addr = text.parse().unwrap();
            assert_eq!(addr.to_string().parse::<Addr>().unwrap(), addr);
        }
    }

    #[test]
    fn constructors_without_syscalls() {
        let lo4 = Addr::loopback(Family::Ipv4, 80).unwrap();
        assert!(lo4.is_loopback());
        assert_eq!(lo4.port(), 80);
        assert_eq!(lo4.family(), Family::Ipv4);

        let any6 = Addr::any(Family::Ipv6, 0).unwrap();
        assert!(!any6.is_loopback());
        assert_eq!(any6.ip(), Some("::".parse().unwrap()));

        assert_eq!(
            Addr::loopback(Family::Unix, 0).unwrap_err().kind(),
            ErrorKind::InvalidParam
        );
    }

    #[test]
    fn masked_comparison() {
        let a: Addr = "127.0.0.1:1000".parse().unwrap();
        let b: Addr = "127.0.0.1:2000".parse().unwrap();
        let c: Addr = "[::1]:1000".parse().unwrap();

        assert!(a.eq_masked(&b, AddrCmp::FAMILY | AddrCmp::IP));
        assert!(!a.eq_masked(&b, AddrCmp::all()));
        assert!(!a.eq_masked(&c, AddrCmp::FAMILY));
        // Same port, different family: the port field alone still matches.
        assert!(a.eq_masked(&c, AddrCmp::PORT));
        assert!(a.eq_masked(&a.clone(), AddrCmp::all()));
    }

    #[test]
    fn multicast_classification() {
        let m4: Addr = "224.0.0.1:0".parse().unwrap();
        let m6: Addr = "[ff02::1]:0".parse().unwrap();
        assert!(m4.is_multicast());
        assert!(m6.is_multicast());
        assert!(!Addr::unix("/tmp/sio.sock").is_multicast());
    }
}
