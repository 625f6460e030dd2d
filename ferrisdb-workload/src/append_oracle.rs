//! Append oracle: out-of-order key reservation, in-order publication
//!
//! Grounded on `table_append_init`/`table_append` in the original format-test
//! harness. Threads reserve the next key ordinal instantly (so inserts can
//! run out of order relative to each other), but the externally visible
//! `rows` boundary only advances once every lower-numbered append has
//! completed — "`rows` never advances past an unresolved insert" (SPEC_FULL §4.8).

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AppendOracle {
    next_key: AtomicU64,
    rows: AtomicU64,
    pending: Mutex<HashSet<u64>>,
}

impl AppendOracle {
    pub fn new(initial_rows: u64) -> Self {
        Self {
            next_key: AtomicU64::new(initial_rows + 1),
            rows: AtomicU64::new(initial_rows),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Reserves the next key ordinal for an append. The caller may take
    /// arbitrarily long to actually publish the insert for this key.
    pub fn reserve(&self) -> u64 {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }

    /// The highest key ordinal such that every key up to and including it
    /// has completed its insert.
    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Acquire)
    }

    /// Marks `key`'s insert as published. If `key` is exactly `rows() + 1`,
    /// advances `rows` and absorbs any other already-completed keys that
    /// were waiting just behind it.
    pub fn complete(&self, key: u64) {
        let mut pending = self.pending.lock();
        let mut rows = self.rows.load(Ordering::Acquire);
        if key != rows + 1 {
            pending.insert(key);
            return;
        }
        rows += 1;
        while pending.remove(&(rows + 1)) {
            rows += 1;
        }
        self.rows.store(rows, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s6_out_of_order_completion_resolves_in_order() {
        let oracle = AppendOracle::new(100);
        let k1 = oracle.reserve();
        let k2 = oracle.reserve();
        let k3 = oracle.reserve();
        assert_eq!((k1, k2, k3), (101, 102, 103));

        oracle.complete(k2);
        assert_eq!(oracle.rows(), 100);
        oracle.complete(k3);
        assert_eq!(oracle.rows(), 100);
        oracle.complete(k1);
        assert_eq!(oracle.rows(), 103);
    }

    #[test]
    fn sequential_completion_advances_immediately() {
        let oracle = AppendOracle::new(0);
        for _ in 0..5 {
            let k = oracle.reserve();
            oracle.complete(k);
        }
        assert_eq!(oracle.rows(), 5);
    }
}
