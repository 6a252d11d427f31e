//! The growable buffer engine.
//!
//! A [`Buffer`] is a contiguous byte region with a read/write cursor and a
//! growth policy. Three backings share the read/seek surface but disagree on
//! the write contract:
//!
//! * owned heap memory, which grows according to [`GrowthStrategy`];
//! * borrowed caller memory ([`Buffer::from_raw_parts`]), always fixed;
//! * a memory-mapped file ([`Buffer::mmap_file`]), fixed, where read-only
//!   mappings refuse writes entirely.
//!
//! At all times `0 <= position <= len <= capacity` and the capacity is
//! aligned to the platform word. Buffers are single-owner values and are not
//! synchronized; a [`BufferPool`] shared between threads needs external
//! locking.

use std::fmt;
use std::path::Path;

use crate::sys;
use crate::{Error, ErrorKind, Result};

/// Default capacity used when a buffer is created with capacity 0.
pub const DEFAULT_CAPACITY: usize = 4096;

const ALIGNMENT: usize = std::mem::size_of::<usize>();

fn align(n: usize) -> usize {
    // Aligning usize::MAX would wrap; the allocation below fails first.
    n.saturating_add(ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

fn alloc_zeroed(capacity: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(capacity)
        .map_err(|_| Error::new(ErrorKind::OutOfMemory))?;
    data.resize(capacity, 0);
    Ok(data)
}

/// How a buffer's capacity grows when a write would exceed it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GrowthStrategy {
    /// No automatic growth; writes past the capacity fail with
    /// [`ErrorKind::BufferTooSmall`].
    Fixed,
    /// Double the capacity until it is sufficient.
    Double,
    /// Add a fixed amount (the growth factor) until sufficient.
    Linear,
    /// Double below 64 KiB, grow by 50% above it.
    #[default]
    Optimal,
}

enum Backing {
    /// Heap memory; the vector's length is the buffer capacity.
    Owned(Vec<u8>),
    /// Borrowed caller memory. Never freed here.
    Raw { ptr: *mut u8, len: usize },
    /// A file mapping, unmapped on drop.
    Mmap(sys::Mmap),
}

/// A growable byte buffer with a cursor.
///
/// See the [module documentation](self) for the backing variants and their
/// write contracts.
pub struct Buffer {
    backing: Backing,
    /// Used bytes.
    len: usize,
    /// Read/write cursor, `<= len`.
    position: usize,
    strategy: GrowthStrategy,
    growth_factor: usize,
}

impl Buffer {
    /// Creates an owned buffer with the default capacity and strategy.
    pub fn new() -> Result<Buffer> {
        Buffer::with_capacity(0)
    }

    /// Creates an owned buffer with at least `capacity` bytes (0 selects
    /// [`DEFAULT_CAPACITY`]) and the [`GrowthStrategy::Optimal`] strategy.
    pub fn with_capacity(capacity: usize) -> Result<Buffer> {
        Buffer::with_strategy(capacity, GrowthStrategy::Optimal, 0)
    }

    /// Creates an owned buffer with an explicit growth strategy.
    ///
    /// `growth_factor` is the per-step increment for
    /// [`GrowthStrategy::Linear`] and is ignored otherwise.
    pub fn with_strategy(
        capacity: usize,
        strategy: GrowthStrategy,
        growth_factor: usize,
    ) -> Result<Buffer> {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            align(capacity)
        };
        Ok(Buffer {
            backing: Backing::Owned(alloc_zeroed(capacity)?),
            len: 0,
            position: 0,
            strategy,
            growth_factor,
        })
    }

    /// Wraps an external memory region without taking ownership.
    ///
    /// The resulting buffer is fixed-size (`len == capacity`) and never
    /// frees the region; the caller retains ownership.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for the
    /// lifetime of the buffer, and must not be accessed through any other
    /// alias while the buffer is alive.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Buffer {
        Buffer {
            backing: Backing::Raw { ptr, len },
            len,
            position: 0,
            strategy: GrowthStrategy::Fixed,
            growth_factor: 0,
        }
    }

    /// Memory-maps a file.
    ///
    /// The capacity and length both equal the file length and the strategy
    /// is fixed. Writes through a `read_only` mapping fail with
    /// [`ErrorKind::ReadOnly`].
    pub fn mmap_file<P: AsRef<Path>>(path: P, read_only: bool) -> Result<Buffer> {
        let map = sys::Mmap::map_file(path.as_ref(), read_only)?;
        let len = map.len();
        Ok(Buffer {
            backing: Backing::Mmap(map),
            len,
            position: 0,
            strategy: GrowthStrategy::Fixed,
            growth_factor: 0,
        })
    }

    /// Number of used bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes are used.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated bytes.
    pub fn capacity(&self) -> usize {
        match &self.backing {
            Backing::Owned(data) => data.len(),
            Backing::Raw { len, .. } => *len,
            Backing::Mmap(map) => map.len(),
        }
    }

    /// The current cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes available for reading, `len - position`.
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// True once the cursor has reached the used length.
    pub fn at_end(&self) -> bool {
        self.position >= self.len
    }

    /// True for memory-mapped buffers.
    pub fn is_mmap(&self) -> bool {
        matches!(self.backing, Backing::Mmap(_))
    }

    /// True if this buffer owns (and will free) its memory.
    pub fn owns_memory(&self) -> bool {
        !matches!(self.backing, Backing::Raw { .. })
    }

    /// The growth strategy in effect.
    pub fn strategy(&self) -> GrowthStrategy {
        self.strategy
    }

    fn data(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(data) => data,
            Backing::Raw { ptr, len } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
            Backing::Mmap(map) => map.as_slice(),
        }
    }

    /// Callers must have rejected read-only mappings first.
    fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Owned(data) => data,
            Backing::Raw { ptr, len } => unsafe { std::slice::from_raw_parts_mut(*ptr, *len) },
            Backing::Mmap(map) => map.as_mut_slice(),
        }
    }

    /// The used bytes, `[..len]`.
    pub fn as_slice(&self) -> &[u8] {
        &self.data()[..self.len]
    }

    /// The unread bytes, `[position..len]`.
    pub fn current_slice(&self) -> &[u8] {
        &self.data()[self.position..self.len]
    }

    fn grown_capacity(&self, needed: usize) -> usize {
        let mut cap = self.capacity();
        match self.strategy {
            GrowthStrategy::Fixed => cap = needed,
            GrowthStrategy::Double => {
                while cap < needed {
                    if cap == 0 || cap > usize::MAX / 2 {
                        cap = needed;
                        break;
                    }
                    cap *= 2;
                }
            }
            GrowthStrategy::Linear => {
                if self.growth_factor == 0 {
                    cap = needed;
                } else {
                    while cap < needed {
                        match cap.checked_add(self.growth_factor) {
                            Some(next) => cap = next,
                            None => {
                                cap = needed;
                                break;
                            }
                        }
                    }
                }
            }
            GrowthStrategy::Optimal => {
                while cap < needed {
                    let next = if cap < 64 * 1024 {
                        if cap == 0 {
                            needed
                        } else {
                            cap.saturating_mul(2)
                        }
                    } else {
                        cap.saturating_add(cap / 2)
                    };
                    if next == cap {
                        cap = needed;
                        break;
                    }
                    cap = next;
                }
            }
        }
        cap.max(needed)
    }

    /// Resizes the buffer to exactly `new_capacity` (word-aligned) bytes.
    ///
    /// Only owned, non-mapped buffers can be resized; others fail with
    /// [`ErrorKind::ReadOnly`]. Shrinking below the used length truncates it
    /// and pulls the cursor back inside.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        let data = match &mut self.backing {
            Backing::Owned(data) => data,
            _ => return Err(Error::new(ErrorKind::ReadOnly)),
        };
        let new_capacity = align(new_capacity);
        if new_capacity > data.len() {
            data.try_reserve_exact(new_capacity - data.len())
                .map_err(|_| Error::new(ErrorKind::OutOfMemory))?;
            data.resize(new_capacity, 0);
        } else if new_capacity < data.len() {
            data.truncate(new_capacity);
            data.shrink_to_fit();
        }
        if new_capacity < self.len {
            self.len = new_capacity;
            if self.position > self.len {
                self.position = self.len;
            }
        }
        Ok(())
    }

    /// Reserves room for `additional` bytes beyond the used length.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.capacity() - self.len >= additional {
            return Ok(());
        }
        let required = self
            .len
            .checked_add(additional)
            .ok_or(Error::new(ErrorKind::BufferTooSmall))?;
        self.resize(required)
    }

    /// Ensures the capacity is at least `min_capacity`.
    pub fn ensure_capacity(&mut self, min_capacity: usize) -> Result<()> {
        if self.capacity() >= min_capacity {
            return Ok(());
        }
        self.resize(min_capacity)
    }

    /// Shrinks the capacity to the used length.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.len == self.capacity() {
            return Ok(());
        }
        self.resize(self.len)
    }

    /// Writes `data` at the cursor, growing the buffer if the strategy
    /// permits, and advances the cursor (and the used length when writing
    /// past it).
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if let Backing::Mmap(map) = &self.backing {
            if map.read_only() {
                return Err(Error::new(ErrorKind::ReadOnly));
            }
        }

        let needed = self
            .position
            .checked_add(data.len())
            .ok_or(Error::new(ErrorKind::BufferTooSmall))?;
        if needed > self.capacity() {
            if !matches!(self.backing, Backing::Owned(_))
                || self.strategy == GrowthStrategy::Fixed
            {
                return Err(Error::new(ErrorKind::BufferTooSmall));
            }
            let new_capacity = self.grown_capacity(needed);
            self.resize(new_capacity)?;
        }

        if !data.is_empty() {
            let position = self.position;
            self.data_mut()[position..position + data.len()].copy_from_slice(data);
            self.position += data.len();
        }
        if self.position > self.len {
            self.len = self.position;
        }
        debug_assert!(self.position <= self.len && self.len <= self.capacity());
        Ok(())
    }

    /// Reads up to `out.len()` bytes from the cursor.
    ///
    /// Returns the number of bytes copied, which is short when fewer are
    /// available. Fails with [`ErrorKind::EndOfStream`] only when the cursor
    /// is already at the end and `out` is non-empty.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let available = self.len - self.position;
        if available == 0 {
            return Err(Error::new(ErrorKind::EndOfStream));
        }
        let n = out.len().min(available);
        out[..n].copy_from_slice(&self.data()[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    /// Moves the cursor to an absolute position, which must not exceed the
    /// used length.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.len {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        self.position = position;
        Ok(())
    }

    /// Moves the cursor relative to its current position, checking bounds in
    /// both directions.
    pub fn seek_relative(&mut self, offset: i64) -> Result<()> {
        if offset < 0 {
            let back = offset.unsigned_abs() as usize;
            if back > self.position {
                return Err(Error::new(ErrorKind::InvalidParam));
            }
            self.position -= back;
        } else {
            let forward = offset as usize;
            let target = self
                .position
                .checked_add(forward)
                .ok_or(Error::new(ErrorKind::InvalidParam))?;
            if target > self.len {
                return Err(Error::new(ErrorKind::InvalidParam));
            }
            self.position = target;
        }
        Ok(())
    }

    /// Truncation support for the buffer stream: moves the used length in
    /// place. Shrinking clamps the cursor; growing zero-fills the new
    /// region, allocating when the strategy allows it.
    pub(crate) fn set_used_len(&mut self, new_len: usize) -> Result<()> {
        if new_len <= self.len {
            self.len = new_len;
            if self.position > self.len {
                self.position = self.len;
            }
            return Ok(());
        }

        if let Backing::Mmap(map) = &self.backing {
            if map.read_only() {
                return Err(Error::new(ErrorKind::ReadOnly));
            }
        }
        if new_len > self.capacity() {
            if !matches!(self.backing, Backing::Owned(_)) {
                return Err(Error::new(ErrorKind::BufferTooSmall));
            }
            self.ensure_capacity(new_len)?;
        }
        let old_len = self.len;
        self.data_mut()[old_len..new_len].fill(0);
        self.len = new_len;
        Ok(())
    }

    /// Resets the used length and cursor to zero. Capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
        self.position = 0;
    }

    /// Returns an owned copy of the used bytes with the cursor rewound.
    pub fn copy(&self) -> Result<Buffer> {
        let mut out = Buffer::with_capacity(self.len)?;
        if self.len > 0 {
            out.write(self.as_slice())?;
        }
        out.position = 0;
        Ok(out)
    }

    /// Writes a `u8` at the cursor.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write(&[value])
    }

    /// Writes a `u16` in host byte order.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write(&value.to_ne_bytes())
    }

    /// Writes a `u32` in host byte order.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write(&value.to_ne_bytes())
    }

    /// Writes a `u64` in host byte order.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write(&value.to_ne_bytes())
    }

    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(Error::new(ErrorKind::EndOfStream));
        }
        let mut out = [0u8; N];
        let n = self.read(&mut out)?;
        debug_assert_eq!(n, N);
        Ok(out)
    }

    /// Reads a `u8`; fails with [`ErrorKind::EndOfStream`] unless the full
    /// width is available.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_exact::<1>().map(|b| b[0])
    }

    /// Reads a `u16` in host byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_exact().map(u16::from_ne_bytes)
    }

    /// Reads a `u32` in host byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_exact().map(u32::from_ne_bytes)
    }

    /// Reads a `u64` in host byte order.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_exact().map(u64::from_ne_bytes)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("position", &self.position)
            .field("strategy", &self.strategy)
            .field("owns_memory", &self.owns_memory())
            .field("is_mmap", &self.is_mmap())
            .finish()
    }
}

/// A fixed set of reusable buffers with used/free accounting.
///
/// `acquire` hands out the first free buffer (linear scan) after clearing
/// it; buffers are addressed by index until released. The pool itself is not
/// synchronized.
pub struct BufferPool {
    buffers: Vec<Buffer>,
    used: Vec<bool>,
    buffer_size: usize,
    in_use: usize,
}

impl BufferPool {
    /// Creates a pool of `count` buffers of `buffer_size` bytes each.
    pub fn new(count: usize, buffer_size: usize) -> Result<BufferPool> {
        if count == 0 || buffer_size == 0 {
            return Err(Error::new(ErrorKind::InvalidParam));
        }
        let mut buffers = Vec::new();
        buffers
            .try_reserve_exact(count)
            .map_err(|_| Error::new(ErrorKind::OutOfMemory))?;
        for _ in 0..count {
            buffers.push(Buffer::with_capacity(buffer_size)?);
        }
        Ok(BufferPool {
            buffers,
            used: vec![false; count],
            buffer_size,
            in_use: 0,
        })
    }

    /// Number of buffers in the pool.
    pub fn capacity(&self) -> usize {
        self.buffers.len()
    }

    /// Number of buffers currently acquired.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// The per-buffer capacity the pool was created with.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Acquires a free buffer, returning its index.
    ///
    /// The buffer is cleared before handout. Fails with [`ErrorKind::Busy`]
    /// when every buffer is in use.
    pub fn acquire(&mut self) -> Result<usize> {
        for (index, used) in self.used.iter_mut().enumerate() {
            if !*used {
                *used = true;
                self.in_use += 1;
                self.buffers[index].clear();
                return Ok(index);
            }
        }
        Err(Error::new(ErrorKind::Busy))
    }

    /// Returns the buffer at `index` if it is currently acquired.
    pub fn get(&self, index: usize) -> Option<&Buffer> {
        if *self.used.get(index)? {
            Some(&self.buffers[index])
        } else {
            None
        }
    }

    /// Mutable variant of [`BufferPool::get`].
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Buffer> {
        if *self.used.get(index)? {
            Some(&mut self.buffers[index])
        } else {
            None
        }
    }

    /// Releases the buffer at `index` back to the pool.
    ///
    /// Fails with [`ErrorKind::AlreadyClosed`] when the index is not
    /// currently acquired, and [`ErrorKind::InvalidParam`] when it is out of
    /// range.
    pub fn release(&mut self, index: usize) -> Result<()> {
        match self.used.get_mut(index) {
            None => Err(Error::new(ErrorKind::InvalidParam)),
            Some(used) if !*used => Err(Error::new(ErrorKind::AlreadyClosed)),
            Some(used) => {
                *used = false;
                self.in_use -= 1;
                Ok(())
            }
        }
    }

    /// Grows or shrinks the pool to `new_count` buffers.
    ///
    /// Acquired buffers are preserved; shrinking fails with
    /// [`ErrorKind::Busy`] if it would drop one (either because fewer slots
    /// than acquired buffers were requested, or because an acquired buffer
    /// sits past the new end).
    pub fn resize(&mut self, new_count: usize) -> Result<()> {
        if new_count < self.in_use {
            return Err(Error::new(ErrorKind::Busy));
        }
        if new_count == self.buffers.len() {
            return Ok(());
        }
        if new_count < self.buffers.len() {
            if self.used[new_count..].iter().any(|used| *used) {
                return Err(Error::new(ErrorKind::Busy));
            }
            self.buffers.truncate(new_count);
            self.used.truncate(new_count);
        } else {
            let additional = new_count - self.buffers.len();
            self.buffers
                .try_reserve_exact(additional)
                .map_err(|_| Error::new(ErrorKind::OutOfMemory))?;
            for _ in 0..additional {
                self.buffers.push(Buffer::with_capacity(self.buffer_size)?);
            }
            self.used.resize(new_count, false);
        }
        Ok(())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_aligned() {
        let buf = Buffer::new().unwrap();
        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
        assert_eq!(buf.capacity() % ALIGNMENT, 0);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.position(), 0);

        let buf = Buffer::with_capacity(5).unwrap();
        assert!(buf.capacity() >= 5);
        assert_eq!(buf.capacity() % ALIGNMENT, 0);
    }

    #[test]
    fn write_read_round_trip() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        buf.write(b"abcdef").unwrap();
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.position(), 6);

        buf.seek(0).unwrap();
        let mut out = [0u8; 6];
        assert_eq!(buf.read(&mut out).unwrap(), 6);
        assert_eq!(&out, b"abcdef");
        assert!(buf.at_end());

        let mut one = [0u8; 1];
        assert_eq!(
            buf.read(&mut one).unwrap_err().kind(),
            ErrorKind::EndOfStream
        );
        assert_eq!(buf.position(), buf.len());
    }

    #[test]
    fn short_read_reports_count() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        buf.write(b"abc").unwrap();
        buf.seek(1).unwrap();
        let mut out = [0u8; 8];
        assert_eq!(buf.read(&mut out).unwrap(), 2);
        assert_eq!(&out[..2], b"bc");
    }

    #[test]
    fn fixed_strategy_refuses_growth() {
        let mut buf = Buffer::with_strategy(8, GrowthStrategy::Fixed, 0).unwrap();
        buf.write(&[0u8; 8]).unwrap();
        assert_eq!(
            buf.write(&[1]).unwrap_err().kind(),
            ErrorKind::BufferTooSmall
        );
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn double_growth() {
        let mut buf = Buffer::with_strategy(8, GrowthStrategy::Double, 0).unwrap();
        buf.write(&[7u8; 20]).unwrap();
        // 8 -> 16 -> 32
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn linear_growth() {
        let mut buf = Buffer::with_strategy(8, GrowthStrategy::Linear, 16).unwrap();
        buf.write(&[7u8; 30]).unwrap();
        // 8 -> 24 -> 40
        assert_eq!(buf.capacity(), 40);
    }

    #[test]
    fn optimal_growth_switches_at_64k() {
        let mut buf = Buffer::with_strategy(64 * 1024, GrowthStrategy::Optimal, 0).unwrap();
        buf.write(&vec![0u8; 64 * 1024 + 1]).unwrap();
        assert_eq!(buf.capacity(), 96 * 1024);
    }

    #[test]
    fn capacity_never_below_len() {
        let mut buf = Buffer::with_capacity(8).unwrap();
        for chunk in 0..64 {
            buf.write(&[chunk as u8; 33]).unwrap();
            assert!(buf.capacity() >= buf.len());
            assert_eq!(buf.capacity() % ALIGNMENT, 0);
        }
    }

    #[test]
    fn seek_bounds() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        buf.write(b"0123456789").unwrap();

        buf.seek(10).unwrap(); // seeking to len exactly is legal
        assert!(buf.at_end());
        assert_eq!(buf.seek(11).unwrap_err().kind(), ErrorKind::InvalidParam);

        buf.seek(5).unwrap();
        buf.seek_relative(-5).unwrap();
        assert_eq!(buf.position(), 0);
        assert_eq!(
            buf.seek_relative(-1).unwrap_err().kind(),
            ErrorKind::InvalidParam
        );
        buf.seek_relative(10).unwrap();
        assert_eq!(
            buf.seek_relative(1).unwrap_err().kind(),
            ErrorKind::InvalidParam
        );
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        buf.write(b"xyz").unwrap();
        let capacity = buf.capacity();
        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn shrink_to_fit_matches_len() {
        let mut buf = Buffer::with_capacity(1024).unwrap();
        buf.write(b"abcdefgh").unwrap();
        buf.shrink_to_fit().unwrap();
        assert_eq!(buf.capacity(), align(8));
        assert_eq!(buf.as_slice(), b"abcdefgh");
    }

    #[test]
    fn integer_round_trip() {
        let mut buf = Buffer::new().unwrap();
        buf.write_u8(0x42).unwrap();
        buf.write_u16(0xABCD).unwrap();
        buf.write_u32(0x1234_5678).unwrap();
        buf.write_u64(0x0123_4567_89AB_CDEF).unwrap();

        buf.seek(0).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 0x42);
        assert_eq!(buf.read_u16().unwrap(), 0xABCD);
        assert_eq!(buf.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(buf.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(buf.read_u8().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn partial_integer_read_does_not_consume() {
        let mut buf = Buffer::new().unwrap();
        buf.write_u8(1).unwrap();
        buf.seek(0).unwrap();
        assert_eq!(buf.read_u32().unwrap_err().kind(), ErrorKind::EndOfStream);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.read_u8().unwrap(), 1);
    }

    #[test]
    fn raw_buffer_is_fixed_and_non_owning() {
        let mut storage = [0u8; 8];
        let mut buf = unsafe { Buffer::from_raw_parts(storage.as_mut_ptr(), storage.len()) };
        assert!(!buf.owns_memory());
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.strategy(), GrowthStrategy::Fixed);

        buf.write(b"12345678").unwrap();
        assert_eq!(
            buf.write(b"9").unwrap_err().kind(),
            ErrorKind::BufferTooSmall
        );
        assert_eq!(buf.resize(16).unwrap_err().kind(), ErrorKind::ReadOnly);
        drop(buf);
        assert_eq!(&storage, b"12345678");
    }

    #[test]
    fn copy_rewinds() {
        let mut buf = Buffer::new().unwrap();
        buf.write(b"payload").unwrap();
        let copy = buf.copy().unwrap();
        assert_eq!(copy.as_slice(), b"payload");
        assert_eq!(copy.position(), 0);
        assert!(copy.owns_memory());
    }

    #[test]
    fn pool_accounting() {
        let mut pool = BufferPool::new(4, 1024).unwrap();
        assert_eq!(pool.capacity(), 4);

        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(pool.acquire().unwrap());
        }
        assert_eq!(pool.in_use(), 4);
        assert_eq!(pool.acquire().unwrap_err().kind(), ErrorKind::Busy);

        pool.release(held[0]).unwrap();
        assert_eq!(pool.in_use(), 3);
        let index = pool.acquire().unwrap();
        assert_eq!(index, held[0]);
        assert_eq!(pool.get(index).unwrap().len(), 0);

        assert_eq!(
            pool.release(held[0] + 100).unwrap_err().kind(),
            ErrorKind::InvalidParam
        );
    }

    #[test]
    fn pool_double_release() {
        let mut pool = BufferPool::new(2, 64).unwrap();
        let index = pool.acquire().unwrap();
        pool.release(index).unwrap();
        assert_eq!(
            pool.release(index).unwrap_err().kind(),
            ErrorKind::AlreadyClosed
        );
    }

    #[test]
    fn pool_resize_limits() {
        let mut pool = BufferPool::new(2, 64).unwrap();
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.resize(1).unwrap_err().kind(), ErrorKind::Busy);

        pool.resize(4).unwrap();
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.in_use(), 2);

        pool.release(a).unwrap();
        // Slot 1 is still held, so shrinking to 1 would drop it.
        assert_eq!(pool.resize(1).unwrap_err().kind(), ErrorKind::Busy);
        pool.resize(2).unwrap();
        assert_eq!(pool.capacity(), 2);
    }
}
