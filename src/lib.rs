//! Cross-platform synchronous stream I/O.
//!
//! SIO provides a uniform, synchronous interface over the operating system's
//! I/O objects. The central type is [`Stream`]: a tagged handle whose
//! operations are dispatched to the backend that created it: a file, a TCP
//! or UDP socket, an anonymous pipe, a timer, a signal source, a terminal or
//! an in-memory buffer. All backends share one read/write/seek/option
//! surface and report failures through a single [`ErrorKind`] taxonomy
//! translated from native error codes.
//!
//! Non-blocking operation is a mode flag ([`StreamFlags::NONBLOCK`]) rather
//! than a completion model; blocking calls that cannot proceed in that mode
//! return [`ErrorKind::WouldBlock`]. There are no internal threads and no
//! readiness multiplexor.
//!
//! # Examples
//!
//! Writing and reading back a file:
//!
//! ```no_run
//! use sio::{OpFlags, Stream, StreamFlags};
//!
//! # fn main() -> sio::Result<()> {
//! let mut file = Stream::open_file(
//!     "t.bin".as_ref(),
//!     StreamFlags::READ | StreamFlags::WRITE | StreamFlags::CREATE | StreamFlags::TRUNC,
//!     0o644,
//! )?;
//! file.write(b"Hello, SIO!", OpFlags::DOALL)?;
//! file.seek(std::io::SeekFrom::Start(0))?;
//!
//! let mut buf = [0u8; 128];
//! let n = file.read(&mut buf, OpFlags::empty())?;
//! assert_eq!(&buf[..n], b"Hello, SIO!");
//! file.close()
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unused_must_use)]

mod addr;
mod buf;
mod error;
pub mod stream;
mod sys;

pub use crate::addr::{Addr, AddrCmp, Family};
pub use crate::buf::{Buffer, BufferPool, GrowthStrategy};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::stream::{
    OpFlags, OptionValue, Stream, StreamFlags, StreamKind, StreamOption,
};
