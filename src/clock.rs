//! Monotonic logical clock
//!
//! Transactions and blocks are stamped with wall-clock milliseconds, but two
//! rapid calls must never produce the same value: block validity and the
//! difficulty adjustment both lean on strictly increasing timestamps. An
//! atomic floor keeps the sequence strictly monotonic even when the OS clock
//! stalls or steps backwards.

use std::sync::atomic::{AtomicU64, Ordering};

static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Current logical time in milliseconds, strictly greater than every value
/// previously returned by this function in this process.
pub fn now_millis() -> u64 {
    let wall = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last + 1);
        match LAST_MILLIS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}
