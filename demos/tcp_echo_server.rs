//! A minimal blocking echo server.
//!
//! Run with `cargo run --example tcp_echo_server`, then connect with e.g.
//! `nc 127.0.0.1 9000`.

use std::io;

use sio::{Addr, OpFlags, Stream, StreamFlags};

fn main() -> io::Result<()> {
    env_logger::init();

    let addr: Addr = "127.0.0.1:9000".parse().map_err(io::Error::from)?;
    let mut server = Stream::open_socket(
        &addr,
        StreamFlags::READ | StreamFlags::WRITE | StreamFlags::TCP | StreamFlags::SERVER,
    )?;
    println!("listening on {}", addr);

    loop {
        let (mut conn, peer) = server.accept()?;
        println!("connection from {}", peer);

        let mut buf = [0u8; 4096];
        loop {
            match conn.read(&mut buf, OpFlags::empty()) {
                Ok(n) => {
                    conn.write(&buf[..n], OpFlags::DOALL)?;
                }
                Err(err) if err.kind() == sio::ErrorKind::EndOfStream => {
                    println!("{} disconnected", peer);
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        conn.close()?;
    }
}
