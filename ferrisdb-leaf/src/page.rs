//! Leaf page mutation state (component E)

use crate::config::LeafConfig;
use crate::cursor::{Position, Target};
use crate::gaplist::GapList;
use crate::insert::InsertNode;
use crate::kv::KeyBytes;
use crate::update::UpdateNode;
use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use parking_lot::Mutex;
use rand::rngs::ThreadRng;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Lazily allocated, fixed-size array of per-slot version-chain heads.
pub(crate) struct UpdatesArray(pub Vec<Atomic<UpdateNode>>);

/// Lazily allocated, fixed-size array of per-gap skip-list heads.
pub(crate) struct GapsArray(pub Vec<Atomic<GapList>>);

/// A leaf page's in-memory mutation state: its sorted on-page keys plus the
/// two lazily allocated auxiliary arrays that anchor every version chain and
/// every inserted-key skip list touching this page.
///
/// A [`crate::memtable::LeafMemTable`] is the degenerate case with zero
/// on-page keys and therefore a single gap.
pub struct LeafPage {
    keys: Vec<KeyBytes>,
    updates: Atomic<UpdatesArray>,
    gaps: Atomic<GapsArray>,
    write_gen: AtomicU32,
    mem_usage: AtomicUsize,
    dirty: AtomicBool,
    /// Per-page serialization ticket (component F's single-writer-at-a-time guarantee).
    pub(crate) ticket: Mutex<()>,
    pub(crate) config: LeafConfig,
    pub(crate) rng: Mutex<ThreadRng>,
}

impl LeafPage {
    /// Builds a page over an immutable, pre-sorted slice of on-page keys.
    pub fn new(keys: Vec<KeyBytes>, config: LeafConfig) -> Self {
        Self {
            keys,
            updates: Atomic::null(),
            gaps: Atomic::null(),
            write_gen: AtomicU32::new(0),
            mem_usage: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
            ticket: Mutex::new(()),
            config,
            rng: Mutex::new(rand::thread_rng()),
        }
    }

    /// Number of on-page keys (`N` in the design notes).
    pub fn n(&self) -> usize {
        self.keys.len()
    }

    pub fn mem_usage(&self) -> usize {
        self.mem_usage.load(Ordering::Relaxed)
    }

    pub(crate) fn mem_incr(&self, bytes: usize) {
        self.mem_usage.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn mem_decr(&self, bytes: usize) {
        self.mem_usage.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    pub(crate) fn write_gen(&self) -> u32 {
        self.write_gen.load(Ordering::Acquire)
    }

    pub(crate) fn write_gen_bump(&self) {
        self.write_gen.fetch_add(1, Ordering::AcqRel);
    }

    /// Ensures `updates` is allocated, racing CAS with any concurrent caller;
    /// the loser's candidate is simply dropped.
    pub(crate) fn ensure_updates<'g>(&self, guard: &'g Guard) -> &'g [Atomic<UpdateNode>] {
        let mut current = self.updates.load(Ordering::Acquire, guard);
        if current.is_null() {
            let candidate = Owned::new(UpdatesArray((0..self.n()).map(|_| Atomic::null()).collect()));
            match self.updates.compare_exchange(
                Shared::null(),
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(installed) => {
                    self.mem_incr(self.n() * std::mem::size_of::<Atomic<UpdateNode>>());
                    current = installed;
                }
                Err(e) => current = e.current,
            }
        }
        &unsafe { current.as_ref() }.unwrap().0
    }

    /// Ensures `gaps` is allocated (`N + 1` entries).
    pub(crate) fn ensure_gaps<'g>(&self, guard: &'g Guard) -> &'g [Atomic<GapList>] {
        let mut current = self.gaps.load(Ordering::Acquire, guard);
        if current.is_null() {
            let candidate = Owned::new(GapsArray((0..=self.n()).map(|_| Atomic::null()).collect()));
            match self.gaps.compare_exchange(
                Shared::null(),
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(installed) => {
                    self.mem_incr((self.n() + 1) * std::mem::size_of::<Atomic<GapList>>());
                    current = installed;
                }
                Err(e) => current = e.current,
            }
        }
        &unsafe { current.as_ref() }.unwrap().0
    }

    /// Ensures `gaps[gap_index]` has a list allocated. Returns `true` when
    /// this call allocated it (the caller must re-initialize any predecessor
    /// stack built against the previously absent head, per SPEC_FULL §4.3).
    pub(crate) fn ensure_gap_head<'g>(
        &self,
        gap_index: usize,
        guard: &'g Guard,
    ) -> (Shared<'g, GapList>, bool) {
        let gaps = self.ensure_gaps(guard);
        let slot = &gaps[gap_index];
        let mut current = slot.load(Ordering::Acquire, guard);
        if !current.is_null() {
            return (current, false);
        }
        let candidate = Owned::new(GapList::new());
        match slot.compare_exchange(Shared::null(), candidate, Ordering::AcqRel, Ordering::Acquire, guard) {
            Ok(installed) => {
                self.mem_incr(self.config.insert_node_overhead_bytes);
                (installed, true)
            }
            Err(e) => {
                current = e.current;
                (current, false)
            }
        }
    }

    /// Returns the existing gap list for `gap_index`, if one has been
    /// allocated, without allocating.
    fn existing_gap<'g>(&self, gap_index: usize, guard: &'g Guard) -> Option<Shared<'g, GapList>> {
        let current = self.gaps.load(Ordering::Acquire, guard);
        let arr = unsafe { current.as_ref() }?;
        let slot = arr.0.get(gap_index)?.load(Ordering::Acquire, guard);
        if slot.is_null() {
            None
        } else {
            Some(slot)
        }
    }

    fn existing_update<'g>(&self, slot: usize, guard: &'g Guard) -> Shared<'g, UpdateNode> {
        let current = self.updates.load(Ordering::Acquire, guard);
        match unsafe { current.as_ref() } {
            None => Shared::null(),
            Some(arr) => arr.0[slot].load(Ordering::Acquire, guard),
        }
    }

    /// The head of the version chain for an existing on-page slot, without
    /// allocating `updates` if it is still absent.
    pub(crate) fn update_head<'g>(&self, slot: usize, guard: &'g Guard) -> Shared<'g, UpdateNode> {
        self.existing_update(slot, guard)
    }

    pub(crate) fn update_slot(&self, slot: usize, guard: &Guard) -> &Atomic<UpdateNode> {
        &self.ensure_updates(guard)[slot]
    }

    /// Positions against this page's on-page keys and, when no on-page key
    /// matches, the relevant gap's skip list. The in-scope stand-in for full
    /// cursor traversal (SPEC_FULL §4.1).
    pub fn search<'g>(&self, key: &[u8], guard: &'g Guard) -> Position<'g> {
        let write_gen_snapshot = self.write_gen();
        match self.keys.binary_search_by(|k| k.as_ref().cmp(key)) {
            Ok(slot) => Position {
                gap_index: slot,
                search_smallest: false,
                target: Target::OnPage(slot),
                write_gen_snapshot,
            },
            Err(slot) => {
                let search_smallest = slot == 0;
                let target = match self.existing_gap(slot, guard) {
                    Some(gap) => {
                        let pos = unsafe { gap.as_ref() }.unwrap().search(key, guard);
                        match pos.matched {
                            Some(node) => Target::Insert(node),
                            None => Target::Gap(pos),
                        }
                    }
                    None => Target::Gap(crate::gaplist::GapPosition {
                        prev: vec![crate::gaplist::Pred::Head; crate::gaplist::MAXDEPTH],
                        next_observed: vec![None; crate::gaplist::MAXDEPTH],
                        matched: None,
                    }),
                };
                Position { gap_index: slot, search_smallest, target, write_gen_snapshot }
            }
        }
    }

    /// Sweeps every version chain on this page for obsolete tails, per
    /// SPEC_FULL §4.7's page-level trigger.
    pub fn prune_obsolete(&self, visible_all: &dyn Fn(u64) -> bool) -> usize {
        let guard = &epoch::pin();
        let mut freed = 0;

        if let Some(arr) = unsafe { self.updates.load(Ordering::Acquire, guard).as_ref() } {
            for entry in &arr.0 {
                freed += crate::collector::prune(entry, visible_all, guard, &self.config);
            }
        }

        if let Some(arr) = unsafe { self.gaps.load(Ordering::Acquire, guard).as_ref() } {
            for gap_entry in &arr.0 {
                let gap = gap_entry.load(Ordering::Acquire, guard);
                if let Some(list) = unsafe { gap.as_ref() } {
                    for node in list.nodes(guard) {
                        let node = unsafe { node.as_ref() }.unwrap();
                        freed += crate::collector::prune(&node.upd, visible_all, guard, &self.config);
                    }
                }
            }
        }

        if freed > 0 {
            self.mem_decr(freed);
        }
        freed
    }
}

impl Drop for LeafPage {
    fn drop(&mut self) {
        let guard = &epoch::pin();
        let updates = self.updates.load(Ordering::Acquire, guard);
        if let Some(arr) = unsafe { updates.as_ref() } {
            for entry in &arr.0 {
                crate::update::destroy_chain(entry, guard);
            }
            unsafe { guard.defer_destroy(updates) };
        }
        let gaps = self.gaps.load(Ordering::Acquire, guard);
        if let Some(arr) = unsafe { gaps.as_ref() } {
            for entry in &arr.0 {
                let g = entry.load(Ordering::Acquire, guard);
                if !g.is_null() {
                    unsafe { guard.defer_destroy(g) };
                }
            }
            unsafe { guard.defer_destroy(gaps) };
        }
    }
}
