/*
[INPUT]:  Wall clock time
[OUTPUT]: Strictly increasing nonces for authenticated commands
[POS]:    Auth layer - nonce generation
[UPDATE]: When the exchange changes nonce resolution
*/

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of authentication nonces.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Microseconds since the Unix epoch, bumped by one whenever the clock has
/// not advanced past the previous nonce.
#[derive(Debug, Default)]
pub struct MonotonicNonce {
    last: AtomicU64,
}

impl MonotonicNonce {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceSource for MonotonicNonce {
    fn next_nonce(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

/// Fixed nonce, for reproducible signatures in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u64);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> u64 {
        self.0
    }
}
