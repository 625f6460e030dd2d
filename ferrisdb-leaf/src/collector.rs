//! Obsolete version collector (component G)
//!
//! Bounds memory growth of version chains without quiescing readers: every
//! truncation is a single CAS on one `next` pointer, safe to run concurrently
//! with the serialization step and with any number of lock-free readers.

use crate::config::LeafConfig;
use crate::update::UpdateNode;
use crossbeam::epoch::{Atomic, Guard};
use std::sync::atomic::Ordering;

/// Attempts to prune the obsolete tail of the version chain rooted at
/// `entry`. Returns the number of bytes freed (0 if nothing was pruned,
/// including the case where another pruner raced and won).
///
/// `visible_all(txn_id)` must report whether every live reader snapshot can
/// observe a version written at `txn_id`; the node found to satisfy it is
/// kept (some reader may still be examining it), and everything strictly
/// after it is truncated.
pub fn prune(
    entry: &Atomic<UpdateNode>,
    visible_all: &dyn Fn(u64) -> bool,
    guard: &Guard,
    config: &LeafConfig,
) -> usize {
    let mut curr = entry.load(Ordering::Acquire, guard);
    let keep = loop {
        let node = match unsafe { curr.as_ref() } {
            None => return 0,
            Some(node) => node,
        };
        if visible_all(node.txn_id) {
            break node;
        }
        curr = node.next.load(Ordering::Acquire, guard);
    };

    let tail = keep.next.load(Ordering::Acquire, guard);
    if tail.is_null() {
        return 0;
    }

    if keep
        .next
        .compare_exchange(tail, crossbeam::epoch::Shared::null(), Ordering::AcqRel, Ordering::Acquire, guard)
        .is_err()
    {
        return 0;
    }

    let mut freed = 0;
    let mut node = tail;
    while !node.is_null() {
        let n = unsafe { node.as_ref() }.unwrap();
        freed += n.payload_len() + config.update_node_overhead_bytes;
        let next = n.next.load(Ordering::Acquire, guard);
        unsafe { guard.defer_destroy(node) };
        node = next;
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::value_from_slice;
    use crossbeam::epoch::{self, Owned};

    fn push(entry: &Atomic<UpdateNode>, txn_id: u64, payload: &[u8], guard: &Guard) {
        let head = entry.load(Ordering::Acquire, guard);
        let mut node = UpdateNode::new(txn_id, Some(value_from_slice(payload)));
        node.next.store(head, Ordering::Relaxed);
        entry.store(Owned::new(node), Ordering::Release);
    }

    #[test]
    fn keeps_the_first_visible_all_version_and_frees_the_rest() {
        let entry = Atomic::null();
        let guard = &epoch::pin();
        push(&entry, 10, b"v1", guard);
        push(&entry, 20, b"v2", guard);
        push(&entry, 30, b"v3", guard);

        // only txn 10 is visible to every reader
        let freed = prune(&entry, &|txn_id| txn_id <= 10, guard, &LeafConfig::default());
        assert!(freed > 0);

        let head = entry.load(Ordering::Acquire, guard);
        let head_node = unsafe { head.as_ref() }.unwrap();
        assert_eq!(head_node.txn_id, 30);
        let next = head_node.next.load(Ordering::Acquire, guard);
        let next_node = unsafe { next.as_ref() }.unwrap();
        assert_eq!(next_node.txn_id, 20);
        let tail = next_node.next.load(Ordering::Acquire, guard);
        assert!(tail.is_null());
    }

    #[test]
    fn no_visible_all_version_prunes_nothing() {
        let entry = Atomic::null();
        let guard = &epoch::pin();
        push(&entry, 10, b"v1", guard);
        let freed = prune(&entry, &|_| false, guard, &LeafConfig::default());
        assert_eq!(freed, 0);
    }
}
