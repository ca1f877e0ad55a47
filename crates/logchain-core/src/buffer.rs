//! Pooled scratch buffers for checksum input.
//!
//! Simple-mode checksums concatenate several fields before hashing. Reusing
//! buffers keeps the hot path allocation-free once the pool is warm.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Capacity of a freshly allocated buffer.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Buffers that grew beyond this are dropped instead of pooled.
pub const MAX_POOLED_CAPACITY: usize = 16 * 1024;

/// Maximum number of idle buffers retained.
pub const MAX_IDLE: usize = 64;

/// A pool of reusable byte buffers.
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub const fn new() -> Self {
        Self {
            idle: parking_lot::const_mutex(Vec::new()),
        }
    }

    /// Take an empty buffer, allocating one if the pool is empty.
    pub fn get(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(DEFAULT_CAPACITY));
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer borrowed from a [`BufferPool`], returned on drop.
pub struct PooledBuffer<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        self.buf.as_ref().unwrap_or(&EMPTY)
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.get_or_insert_with(Vec::new)
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}

static EMPTY: Vec<u8> = Vec::new();

static SCRATCH: BufferPool = BufferPool::new();

/// Borrow a buffer from the process-wide scratch pool.
pub fn scratch() -> PooledBuffer<'static> {
    SCRATCH.get()
}
