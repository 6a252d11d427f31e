use sio::{Addr, AddrCmp, ErrorKind, Family};

mod util;
use util::init;

#[test]
fn parse_format_round_trip() {
    init();
    for text in [
        "127.0.0.1:9877",
        "0.0.0.0:0",
        "192.168.1.100:65535",
        "[::1]:8080",
        "[fe80::1]:443",
    ] {
        let addr: Addr = text.parse().unwrap();
        let formatted = addr.to_string();
        assert_eq!(formatted.parse::<Addr>().unwrap(), addr, "{}", text);
    }

    assert_eq!(
        "not-an-address".parse::<Addr>().unwrap_err().kind(),
        ErrorKind::InvalidAddress
    );
    assert_eq!(
        "127.0.0.1".parse::<Addr>().unwrap_err().kind(),
        ErrorKind::InvalidAddress
    );
}

#[test]
fn well_known_addresses() {
    init();
    let lo = Addr::loopback(Family::Ipv4, 9877).unwrap();
    assert_eq!(lo.to_string(), "127.0.0.1:9877");
    assert!(lo.is_loopback());

    let any = Addr::any(Family::Ipv4, 0).unwrap();
    assert_eq!(any.to_string(), "0.0.0.0:0");
    assert!(!any.is_loopback());

    let lo6 = Addr::loopback(Family::Ipv6, 443).unwrap();
    assert_eq!(lo6.to_string(), "[::1]:443");
    assert_eq!(lo6.family(), Family::Ipv6);
}

#[test]
fn masked_equality() {
    init();
    let a: Addr = "10.0.0.1:80".parse().unwrap();
    let b: Addr = "10.0.0.1:8080".parse().unwrap();
    let c: Addr = "10.0.0.2:80".parse().unwrap();

    assert!(a.eq_masked(&b, AddrCmp::FAMILY | AddrCmp::IP));
    assert!(!a.eq_masked(&b, AddrCmp::PORT));
    assert!(a.eq_masked(&c, AddrCmp::FAMILY | AddrCmp::PORT));
    assert!(!a.eq_masked(&c, AddrCmp::all()));
}

#[test]
fn unix_addresses() {
    init();
    let sock = Addr::unix("/tmp/service.sock");
    assert_eq!(sock.family(), Family::Unix);
    assert_eq!(sock.port(), 0);
    assert_eq!(sock.path().unwrap(), std::path::Path::new("/tmp/service.sock"));
    assert!(sock.eq_masked(&Addr::unix("/tmp/service.sock"), AddrCmp::all()));
    assert!(!sock.eq_masked(&Addr::unix("/tmp/other.sock"), AddrCmp::IP));
}
