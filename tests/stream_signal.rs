//! Signal-stream test. Runs without the libtest harness so the signal mask
//! is set up on the main thread before any other thread exists; threads
//! spawned afterwards inherit it, keeping process-directed signals routed
//! to the signalfd.

fn main() {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    imp::run();
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod imp {
    use std::time::Duration;

    use sio::{ErrorKind, OpFlags, Stream, StreamFlags, StreamKind};

    const RW: StreamFlags = StreamFlags::READ.union(StreamFlags::WRITE);

    pub fn run() {
        let mut stream = Stream::open_signal(&[libc::SIGUSR1], RW).unwrap();
        assert_eq!(stream.kind(), StreamKind::Signal);

        // Nothing pending yet.
        let mut probe = [0u8; 4];
        match stream.read(&mut probe, OpFlags::DONT_WAIT) {
            Err(err) => assert_eq!(err.kind(), ErrorKind::WouldBlock),
            Ok(n) => panic!("expected would-block, read {} bytes", n),
        }

        // Writing sends the signal: first word is the signal number, the
        // (omitted) second word defaults to the current process.
        let payload = (libc::SIGUSR1 as i32).to_ne_bytes();
        assert_eq!(stream.write(&payload, OpFlags::empty()).unwrap(), 4);

        let info = stream.read_signal(OpFlags::empty()).unwrap();
        assert_eq!(info.signo, libc::SIGUSR1 as u32);
        assert_eq!(info.pid, std::process::id());

        // A forked child signals the parent after a delay, waking the
        // parent's blocking read.
        let child = unsafe { libc::fork() };
        assert!(child >= 0, "fork failed");
        if child == 0 {
            std::thread::sleep(Duration::from_millis(100));
            unsafe {
                libc::kill(libc::getppid(), libc::SIGUSR1);
                libc::_exit(0);
            }
        }

        // The raw payload carries the full native record when it fits.
        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf, OpFlags::empty()).unwrap();
        assert_eq!(n, std::mem::size_of::<libc::signalfd_siginfo>());
        let signo = u32::from_ne_bytes(buf[..4].try_into().unwrap());
        assert_eq!(signo, libc::SIGUSR1 as u32);

        let mut status = 0;
        unsafe {
            libc::waitpid(child, &mut status, 0);
        }

        // A too-small buffer still yields the signal number alone.
        unsafe {
            libc::kill(libc::getpid(), libc::SIGUSR1);
        }
        let mut small = [0u8; 4];
        assert_eq!(stream.read(&mut small, OpFlags::empty()).unwrap(), 4);
        assert_eq!(
            u32::from_ne_bytes(small),
            libc::SIGUSR1 as u32
        );

        stream.close().unwrap();
        assert_eq!(stream.close().unwrap_err().kind(), ErrorKind::AlreadyClosed);

        println!("stream_signal: ok");
    }
}
