//! Insert node / skip-list node (component C)

use crate::kv::KeyBytes;
use crate::update::UpdateNode;
use crossbeam::epoch::Atomic;
use parking_lot::Mutex;
use rand::Rng;

/// A new key spliced into a gap's skip list.
///
/// Carries its own immutable key bytes, a version-chain head exactly like a
/// page's `updates[i]` slot, and a forward-pointer array sized to its height.
pub struct InsertNode {
    /// The inserted key's bytes.
    pub key: KeyBytes,
    /// Head of this key's version chain. Treated identically to an
    /// on-page `updates[slot]` entry once published.
    pub upd: Atomic<UpdateNode>,
    /// Forward pointers, one per level this node participates in
    /// (`next.len() == height`).
    pub next: Vec<Atomic<InsertNode>>,
}

impl InsertNode {
    /// Allocates a new insert node of the given height with an initial version.
    pub fn new(key: KeyBytes, initial: UpdateNode, height: usize) -> Self {
        let mut next = Vec::with_capacity(height);
        for _ in 0..height {
            next.push(Atomic::null());
        }
        let upd = Atomic::new(initial);
        Self { key, upd, next }
    }

    /// Height this node participates at (number of levels).
    pub fn height(&self) -> usize {
        self.next.len()
    }

    /// Approximate heap footprint of the node itself, excluding its version chain.
    pub fn overhead_len(&self, per_node_overhead: usize) -> usize {
        self.key.len() + self.next.len() * std::mem::size_of::<Atomic<InsertNode>>() + per_node_overhead
    }
}

impl Drop for InsertNode {
    fn drop(&mut self) {
        let guard = &crossbeam::epoch::pin();
        crate::update::destroy_chain(&self.upd, guard);
    }
}

/// Draws a skip-list height from the geometric distribution with ratio
/// `1 / branching_factor`, bounded by `max_height`.
///
/// `rng` is taken as `&Mutex<R>` rather than thread-local state so that a
/// single [`crate::page::LeafPage`] can share one generator the way the
/// existing `SkipList::random_height` shares `self.rng`.
pub fn random_height<R: Rng>(rng: &Mutex<R>, max_height: usize, branching_factor: u32) -> usize {
    let mut height = 1;
    let mut rng = rng.lock();
    while height < max_height && rng.gen_ratio(1, branching_factor) {
        height += 1;
    }
    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn height_never_exceeds_max() {
        let rng = Mutex::new(StdRng::seed_from_u64(42));
        for _ in 0..1000 {
            let h = random_height(&rng, 17, 4);
            assert!((1..=17).contains(&h));
        }
    }

    #[test]
    fn new_node_has_requested_height() {
        let node = InsertNode::new(
            crate::kv::key_from_slice(b"k"),
            UpdateNode::new(1, Some(crate::kv::value_from_slice(b"v"))),
            5,
        );
        assert_eq!(node.height(), 5);
    }
}
