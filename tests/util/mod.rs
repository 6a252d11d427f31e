// Not all helpers are used by all test binaries.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use rand::Rng;

use sio::ErrorKind;

pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // A failure here means the logger was already set; that is fine.
        let _ = env_logger::try_init();
    });
}

/// A unique path under the system temp directory; any stale file from an
/// earlier run is removed.
pub fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let tag: u32 = rand::rng().random();
    path.push(format!("sio-{}-{:08x}-{}", std::process::id(), tag, name));
    let _ = std::fs::remove_file(&path);
    path
}

pub fn assert_would_block<T: std::fmt::Debug>(result: sio::Result<T>) {
    match result {
        Ok(value) => panic!("expected would-block, got {:?}", value),
        Err(err) => assert_eq!(err.kind(), ErrorKind::WouldBlock),
    }
}

pub fn assert_end_of_stream<T: std::fmt::Debug>(result: sio::Result<T>) {
    match result {
        Ok(value) => panic!("expected end of stream, got {:?}", value),
        Err(err) => assert_eq!(err.kind(), ErrorKind::EndOfStream),
    }
}
