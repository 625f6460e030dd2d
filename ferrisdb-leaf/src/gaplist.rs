//! Skip-list head and ordered-gap positioning (component D)
//!
//! One [`GapList`] anchors the ordered skip list of keys inserted strictly
//! within a single gap between on-page keys. Unlike
//! `ferrisdb_storage::memtable::skiplist::SkipList`, which anchors its list
//! with a sentinel head node, this list is anchored by a bare array of
//! forward pointers: the model the source algorithm uses, where "the
//! predecessor is either the head array or a node" is an explicit case split
//! rather than something a sentinel node can absorb.

use crate::insert::InsertNode;
use crossbeam::epoch::{Guard, Shared};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;

pub use crossbeam::epoch::Atomic;

/// Compile-time bound on skip-list height, nominally 17 per the source design.
pub const MAXDEPTH: usize = 17;

/// A predecessor reference captured during positioning: either the gap's
/// own head array, or a previously observed node.
#[derive(Clone, Copy)]
pub enum Pred<'g> {
    Head,
    Node(Shared<'g, InsertNode>),
}

/// Result of positioning within one gap's skip list.
pub struct GapPosition<'g> {
    /// Predecessor at every level, from 0 to `MAXDEPTH - 1`.
    pub prev: Vec<Pred<'g>>,
    /// What `prev[level]`'s forward pointer pointed to at observation time.
    pub next_observed: Vec<Option<Shared<'g, InsertNode>>>,
    /// The node found with an exactly matching key, if any.
    pub matched: Option<Shared<'g, InsertNode>>,
}

/// Ordered skip list of keys inserted into one gap.
pub struct GapList {
    head: Vec<Atomic<InsertNode>>,
    tail: Vec<Atomic<InsertNode>>,
}

impl GapList {
    /// Builds a fresh, empty gap list.
    pub fn new() -> Self {
        let mut head = Vec::with_capacity(MAXDEPTH);
        let mut tail = Vec::with_capacity(MAXDEPTH);
        for _ in 0..MAXDEPTH {
            head.push(Atomic::null());
            tail.push(Atomic::null());
        }
        Self { head, tail }
    }

    fn next_of<'g>(&self, pred: &Pred<'g>, level: usize, guard: &'g Guard) -> Shared<'g, InsertNode> {
        match pred {
            Pred::Head => self.head[level].load(Ordering::Acquire, guard),
            Pred::Node(n) => unsafe { n.as_ref() }.unwrap().next[level].load(Ordering::Acquire, guard),
        }
    }

    /// Locates `key` within this gap, returning the predecessor stack and,
    /// if present, the node whose key matches exactly.
    pub fn search<'g>(&self, key: &[u8], guard: &'g Guard) -> GapPosition<'g> {
        let mut prev = vec![Pred::Head; MAXDEPTH];
        let mut next_observed: Vec<Option<Shared<'g, InsertNode>>> = vec![None; MAXDEPTH];
        let mut pred = Pred::Head;
        let mut matched: Option<Shared<'g, InsertNode>> = None;

        for level in (0..MAXDEPTH).rev() {
            let mut curr = self.next_of(&pred, level, guard);
            loop {
                let node = match unsafe { curr.as_ref() } {
                    None => break,
                    Some(node) => node,
                };
                match (*node.key).cmp(key) {
                    CmpOrdering::Less => {
                        pred = Pred::Node(curr);
                        curr = self.next_of(&pred, level, guard);
                    }
                    CmpOrdering::Equal => {
                        matched = Some(curr);
                        break;
                    }
                    CmpOrdering::Greater => break,
                }
            }
            prev[level] = pred;
            next_observed[level] = if curr.is_null() { None } else { Some(curr) };
        }

        GapPosition { prev, next_observed, matched }
    }

    /// Re-validates a predecessor stack at every level the new node
    /// participates at. Returns `false` (restart) if any level moved.
    pub fn validate(&self, pos: &GapPosition<'_>, height: usize, guard: &Guard) -> bool {
        for level in 0..height {
            let current = self.next_of(&pos.prev[level], level, guard);
            let expected = pos.next_observed[level];
            let unchanged = match expected {
                Some(s) => current == s,
                None => current.is_null(),
            };
            if !unchanged {
                return false;
            }
            if expected.is_none() {
                let tail = self.tail[level].load(Ordering::Acquire, guard);
                let prev_is_tail = match pos.prev[level] {
                    Pred::Head => tail.is_null(),
                    Pred::Node(n) => tail == n,
                };
                if !prev_is_tail {
                    return false;
                }
            }
        }
        true
    }

    /// Two-phase publish: initializes the new node's forward pointers, then
    /// (after a release fence) links predecessors and advances tails.
    ///
    /// Caller must have already validated with [`GapList::validate`] under
    /// the page's serialization ticket, so this performs plain stores rather
    /// than compare-and-swap.
    pub fn publish<'g>(&self, pos: &GapPosition<'g>, node: &InsertNode, node_shared: Shared<'g, InsertNode>, guard: &'g Guard) {
        let height = node.height();
        for level in 0..height {
            let next = pos.next_observed[level].unwrap_or_else(Shared::null);
            node.next[level].store(next, Ordering::Relaxed);
        }

        std::sync::atomic::fence(Ordering::Release);

        for level in 0..height {
            let is_new_tail = pos.next_observed[level].is_none();
            if is_new_tail {
                self.tail[level].store(node_shared, Ordering::Release);
            }
            match pos.prev[level] {
                Pred::Head => self.head[level].store(node_shared, Ordering::Release),
                Pred::Node(n) => unsafe { n.as_ref() }.unwrap().next[level].store(node_shared, Ordering::Release),
            }
            let _ = guard;
        }
    }

    /// Walks level 0 from the head, for tests and property checks.
    pub fn iter_keys<'g>(&self, guard: &'g Guard) -> Vec<Vec<u8>> {
        self.nodes(guard)
            .into_iter()
            .map(|n| unsafe { n.as_ref() }.unwrap().key.to_vec())
            .collect()
    }

    /// Every node reachable from level 0, in ascending key order. Used by
    /// the page-level obsolete sweep to reach each inserted key's version
    /// chain without re-deriving the skip-list walk there.
    pub fn nodes<'g>(&self, guard: &'g Guard) -> Vec<Shared<'g, InsertNode>> {
        let mut out = Vec::new();
        let mut curr = self.head[0].load(Ordering::Acquire, guard);
        while !curr.is_null() {
            out.push(curr);
            curr = unsafe { curr.as_ref() }.unwrap().next[0].load(Ordering::Acquire, guard);
        }
        out
    }
}

impl Default for GapList {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GapList {
    fn drop(&mut self) {
        let guard = &crossbeam::epoch::pin();
        let mut curr = self.head[0].load(Ordering::Acquire, guard);
        while !curr.is_null() {
            let next = unsafe { curr.as_ref() }.unwrap().next[0].load(Ordering::Acquire, guard);
            unsafe { guard.defer_destroy(curr) };
            curr = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{key_from_slice, value_from_slice};
    use crate::update::UpdateNode;
    use crossbeam::epoch::{self, Owned};

    fn insert_key(list: &GapList, key: &[u8]) {
        let guard = &epoch::pin();
        let pos = list.search(key, guard);
        assert!(pos.matched.is_none(), "duplicate key in test helper");
        let node = InsertNode::new(
            key_from_slice(key),
            UpdateNode::new(1, Some(value_from_slice(b"v"))),
            3,
        );
        assert!(list.validate(&pos, node.height(), guard));
        let owned = Owned::new(node);
        let shared = owned.into_shared(guard);
        let node_ref = unsafe { shared.as_ref() }.unwrap();
        list.publish(&pos, node_ref, shared, guard);
    }

    #[test]
    fn ascending_insert_order_preserved() {
        let list = GapList::new();
        insert_key(&list, b"b");
        insert_key(&list, b"a");
        insert_key(&list, b"c");

        let guard = &epoch::pin();
        assert_eq!(list.iter_keys(guard), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn search_finds_exact_match() {
        let list = GapList::new();
        insert_key(&list, b"k");
        let guard = &epoch::pin();
        let pos = list.search(b"k", guard);
        assert!(pos.matched.is_some());
    }
}
