//! Shared chain state.
//!
//! One [`ChainState`] exists per handler chain root. Every handler derived
//! from that root holds the same `Arc<ChainState>`, so all of them extend a
//! single checksum chain.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::enricher::thread_number;
use crate::error::{HandlerError, Result};

/// The running checksum of a handler chain.
#[derive(Debug, Default)]
pub struct ChainState {
    value: Mutex<u16>,
    /// Thread number of the current holder, 0 when free.
    owner: AtomicU64,
}

impl ChainState {
    /// Create a chain starting from `seed`.
    pub fn new(seed: u16) -> Self {
        Self {
            value: Mutex::new(seed),
            owner: AtomicU64::new(0),
        }
    }

    /// Acquire exclusive access to the chain.
    ///
    /// The chain only moves while a guard is held, and holders see each
    /// other's updates in lock order. The lock is not reentrant: asking for
    /// it again on the thread that holds it fails with
    /// [`HandlerError::Reentrant`] instead of blocking forever.
    pub fn lock(&self) -> Result<ChainGuard<'_>> {
        let me = thread_number();
        if self.owner.load(Ordering::Acquire) == me {
            return Err(HandlerError::Reentrant);
        }
        let value = self.value.lock();
        self.owner.store(me, Ordering::Release);
        Ok(ChainGuard {
            value,
            owner: &self.owner,
        })
    }

    /// Snapshot of the current value.
    pub fn current(&self) -> u16 {
        *self.value.lock()
    }
}

/// Exclusive access to a [`ChainState`].
pub struct ChainGuard<'a> {
    value: MutexGuard<'a, u16>,
    owner: &'a AtomicU64,
}

impl ChainGuard<'_> {
    /// The value the next record chains from.
    pub fn value(&self) -> u16 {
        *self.value
    }

    /// Move the chain forward to `sum`.
    pub fn advance(&mut self, sum: u16) {
        *self.value = sum;
    }
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        // Cleared before the mutex is released.
        self.owner.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_advance_visible_to_next_holder() {
        let chain = ChainState::new(0xAAAA);
        {
            let mut guard = chain.lock().unwrap();
            assert_eq!(guard.value(), 0xAAAA);
            guard.advance(0x1234);
        }
        assert_eq!(chain.current(), 0x1234);
    }

    #[test]
    fn test_concurrent_advances_serialize() {
        let chain = Arc::new(ChainState::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let chain = chain.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let mut guard = chain.lock().unwrap();
                        let next = guard.value().wrapping_add(1);
                        guard.advance(next);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(chain.current(), 8000);
    }

    #[test]
    fn test_relock_on_holding_thread_fails() {
        let chain = Arc::new(ChainState::new(7));
        let guard = chain.lock().unwrap();
        assert!(matches!(chain.lock(), Err(HandlerError::Reentrant)));

        // Other threads still wait for the holder instead of failing.
        let other = {
            let chain = chain.clone();
            thread::spawn(move || chain.lock().map(|g| g.value()).ok())
        };
        drop(guard);
        assert_eq!(other.join().unwrap(), Some(7));
        assert!(chain.lock().is_ok());
    }
}
