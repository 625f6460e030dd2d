//! Update node and version chain (component B)
//!
//! A version chain is a singly-linked, head-inserted list of [`UpdateNode`]s.
//! New versions are pushed at the head by the serialization step; the tail is
//! pruned in place by the obsolete collector. Once a node's `next` is non-null
//! it only ever transitions to absent, never to another node.

use crate::kv::ValueBytes;
use crossbeam::epoch::{Atomic, Guard};
use std::sync::atomic::Ordering;

/// A single MVCC version of a key.
///
/// `payload.is_none()` encodes a tombstone: the key was deleted as of `txn_id`.
pub struct UpdateNode {
    /// Transaction id that produced this version.
    pub txn_id: u64,
    /// The value written, or `None` for a delete.
    pub payload: Option<ValueBytes>,
    /// Next-older version in the chain, or null at the tail.
    pub next: Atomic<UpdateNode>,
}

impl UpdateNode {
    /// Allocates a new version node with no chain linkage yet.
    pub fn new(txn_id: u64, payload: Option<ValueBytes>) -> Self {
        Self {
            txn_id,
            payload,
            next: Atomic::null(),
        }
    }

    /// Approximate heap footprint of this node's payload, for byte accounting.
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, |p| p.len())
    }

    /// Whether this version represents a delete.
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_none()
    }
}

/// Walks a version chain from `entry` to its tail, deferring destruction of
/// every node reachable from it. Used when an owning page or insert node is
/// itself being torn down; does not touch `entry` itself.
pub fn destroy_chain(entry: &Atomic<UpdateNode>, guard: &Guard) {
    let mut curr = entry.load(Ordering::Acquire, guard);
    while !curr.is_null() {
        let next = unsafe { curr.as_ref() }.unwrap().next.load(Ordering::Acquire, guard);
        unsafe { guard.defer_destroy(curr) };
        curr = next;
    }
}
