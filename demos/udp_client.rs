//! Sends one datagram to a local UDP server through a pseudo-socket.
//!
//! Run with `cargo run --example udp_client -- 'some message'`.

use std::io;

use sio::{Addr, OpFlags, Stream, StreamFlags};

fn main() -> io::Result<()> {
    env_logger::init();

    let message = std::env::args().nth(1).unwrap_or_else(|| "ping".into());
    let addr: Addr = "127.0.0.1:9001".parse().map_err(io::Error::from)?;

    // A datagram socket opened without the server flag keeps `addr` as its
    // default peer, so a plain write becomes a sendto.
    let mut socket = Stream::open_socket(&addr, StreamFlags::WRITE)?;
    let sent = socket.write(message.as_bytes(), OpFlags::empty())?;
    println!("sent {} bytes to {}", sent, addr);
    socket.close()?;
    Ok(())
}
