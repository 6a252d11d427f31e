use std::io::{IoSlice, IoSliceMut};
use std::thread;
use std::time::Duration;

use sio::{Addr, ErrorKind, OpFlags, OptionValue, Stream, StreamFlags, StreamKind, StreamOption};

mod util;
use util::{assert_would_block, init};

const UDP_MESSAGE: &[u8] = b"Hello UDP server!";

fn addr(port: u16) -> Addr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

#[test]
fn udp_send_and_receive() {
    init();
    let server_addr = addr(9877);

    let mut server = Stream::open_socket(&server_addr, StreamFlags::READ | StreamFlags::SERVER)
        .unwrap();
    assert_eq!(server.kind(), StreamKind::UdpSocket);

    // Datagram clients become pseudo-sockets with the open address as their
    // default peer.
    let mut client =
        Stream::open_socket(&server_addr, StreamFlags::WRITE).unwrap();
    assert_eq!(client.kind(), StreamKind::UdpSocket);
    assert_eq!(
        client.write(UDP_MESSAGE, OpFlags::empty()).unwrap(),
        UDP_MESSAGE.len()
    );

    thread::sleep(Duration::from_millis(50));

    let mut buf = [0u8; 64];
    let n = server.read(&mut buf, OpFlags::empty()).unwrap();
    assert_eq!(n, UDP_MESSAGE.len());
    assert_eq!(&buf[..n], UDP_MESSAGE);

    client.close().unwrap();
    server.close().unwrap();
}

#[test]
fn udp_vectored_is_one_datagram() {
    init();
    let server_addr = addr(9879);

    let mut server = Stream::open_socket(&server_addr, StreamFlags::READ | StreamFlags::SERVER)
        .unwrap();
    let mut client = Stream::open_socket(&server_addr, StreamFlags::WRITE).unwrap();

    // Gather-writes are staged into a single message.
    let parts = [IoSlice::new(b"Hello UDP "), IoSlice::new(b"server!")];
    assert_eq!(client.write_vectored(&parts, OpFlags::empty()).unwrap(), 17);

    thread::sleep(Duration::from_millis(50));

    let mut first = [0u8; 5];
    let mut second = [0u8; 32];
    let mut bufs = [IoSliceMut::new(&mut first), IoSliceMut::new(&mut second)];
    let n = server.read_vectored(&mut bufs, OpFlags::empty()).unwrap();
    assert_eq!(n, 17);
    assert_eq!(&first, b"Hello");
    assert_eq!(&second[..12], b" UDP server!");

    client.close().unwrap();
    server.close().unwrap();
}

#[test]
fn tcp_round_trip() {
    init();
    let server_addr = addr(9878);

    let mut server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP | StreamFlags::SERVER,
    )
    .unwrap();
    assert_eq!(server.kind(), StreamKind::TcpSocket);

    let handle = thread::spawn(move || {
        let mut client = Stream::open_socket(
            &addr(9878),
            StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP,
        )
        .unwrap();
        client.write(b"ping", OpFlags::DOALL).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(client.read(&mut buf, OpFlags::DOALL).unwrap(), 4);
        assert_eq!(&buf, b"pong");
        client.close().unwrap();
    });

    let (mut conn, peer) = server.accept().unwrap();
    assert_eq!(conn.kind(), StreamKind::TcpSocket);
    assert!(peer.is_loopback());
    assert!(!conn.flags().contains(StreamFlags::SERVER));

    let mut buf = [0u8; 4];
    assert_eq!(conn.read(&mut buf, OpFlags::DOALL).unwrap(), 4);
    assert_eq!(&buf, b"ping");
    conn.write(b"pong", OpFlags::DOALL).unwrap();

    // The peer closing its end reads as end of stream.
    handle.join().unwrap();
    assert_eq!(
        conn.read(&mut buf, OpFlags::empty()).unwrap_err().kind(),
        ErrorKind::EndOfStream
    );

    conn.close().unwrap();
    server.close().unwrap();
}

#[test]
fn tcp_vectored() {
    init();
    let server_addr = addr(9880);

    let mut server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP | StreamFlags::SERVER,
    )
    .unwrap();

    let handle = thread::spawn(move || {
        let mut client = Stream::open_socket(
            &addr(9880),
            StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP,
        )
        .unwrap();
        let parts = [IoSlice::new(b"head-"), IoSlice::new(b"tail")];
        assert_eq!(client.write_vectored(&parts, OpFlags::empty()).unwrap(), 9);
        client.close().unwrap();
    });

    let (mut conn, _) = server.accept().unwrap();
    let mut buf = [0u8; 9];
    assert_eq!(conn.read(&mut buf, OpFlags::DOALL).unwrap(), 9);
    assert_eq!(&buf, b"head-tail");

    handle.join().unwrap();
    conn.close().unwrap();
    server.close().unwrap();
}

#[test]
fn nonblocking_accept_would_block() {
    init();
    let server_addr = addr(9881);

    let mut server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::TCP | StreamFlags::SERVER | StreamFlags::NONBLOCK,
    )
    .unwrap();

    assert_would_block(server.accept());
    server.close().unwrap();
}

#[test]
fn nonblocking_udp_read_would_block() {
    init();
    let server_addr = addr(9882);

    let mut server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::SERVER | StreamFlags::NONBLOCK,
    )
    .unwrap();

    let mut buf = [0u8; 16];
    assert_would_block(server.read(&mut buf, OpFlags::empty()));
    server.close().unwrap();
}

#[test]
fn socket_options() {
    init();
    let server_addr = addr(9883);

    let server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP | StreamFlags::SERVER,
    )
    .unwrap();

    // Listening stream sockets are opened with SO_REUSEADDR.
    assert_eq!(
        server.get_option(StreamOption::ReuseAddr).unwrap(),
        OptionValue::Bool(true)
    );

    let mut client = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP,
    )
    .unwrap();

    client
        .set_option(StreamOption::NoDelay, OptionValue::Bool(true))
        .unwrap();
    assert_eq!(
        client.get_option(StreamOption::NoDelay).unwrap(),
        OptionValue::Bool(true)
    );

    client
        .set_option(StreamOption::KeepAlive, OptionValue::Bool(true))
        .unwrap();
    assert_eq!(
        client.get_option(StreamOption::KeepAlive).unwrap(),
        OptionValue::Bool(true)
    );

    let recv_buffer = client
        .get_option(StreamOption::RecvBuffer)
        .unwrap()
        .as_uint()
        .unwrap();
    assert!(recv_buffer > 0);

    assert_eq!(client.take_error().unwrap(), None);

    // Blocking mode is switchable after open.
    client
        .set_option(StreamOption::Blocking, OptionValue::Bool(false))
        .unwrap();
    assert_eq!(
        client.get_option(StreamOption::Blocking).unwrap(),
        OptionValue::Bool(false)
    );

    client.close().unwrap();
    drop(server);
}

#[test]
fn datagram_without_peer_needs_address() {
    init();
    // A bound datagram server has no default destination.
    let mut server = Stream::open_socket(
        &addr(9884),
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::SERVER,
    )
    .unwrap();
    assert_eq!(
        server.write(b"nowhere", OpFlags::empty()).unwrap_err().kind(),
        ErrorKind::AddressRequired
    );
    server.close().unwrap();
}

#[cfg(unix)]
#[test]
fn unix_stream_round_trip() {
    init();
    let path = util::temp_path("uds.sock");
    let server_addr = Addr::unix(&path);

    let mut server = Stream::open_socket(
        &server_addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP | StreamFlags::SERVER,
    )
    .unwrap();
    assert_eq!(server.kind(), StreamKind::UnixSocket);

    let client_addr = server_addr.clone();
    let handle = thread::spawn(move || {
        let mut client = Stream::open_socket(
            &client_addr,
            StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP,
        )
        .unwrap();
        client.write(b"local", OpFlags::DOALL).unwrap();
        client.close().unwrap();
    });

    let (mut conn, _) = server.accept().unwrap();
    let mut buf = [0u8; 5];
    assert_eq!(conn.read(&mut buf, OpFlags::DOALL).unwrap(), 5);
    assert_eq!(&buf, b"local");

    handle.join().unwrap();
    conn.close().unwrap();
    server.close().unwrap();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn accept_on_non_socket_is_rejected() {
    init();
    let mut buffer = Stream::open_buffer(
        sio::Buffer::new().unwrap(),
        StreamFlags::READ | StreamFlags::WRITE,
    )
    .unwrap();
    assert_eq!(buffer.accept().unwrap_err().kind(), ErrorKind::NotASocket);
}
