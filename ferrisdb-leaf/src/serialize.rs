//! Serialization / publish step (component F)
//!
//! Runs under the page's single ticket (`LeafPage::ticket`). Readers never
//! take this ticket; only one writer validates and publishes against a given
//! page at a time, which is what lets the actual pointer links below use
//! plain loads/stores instead of compare-and-swap — the CAS machinery lives
//! entirely in the lazy-allocation paths (`LeafPage::ensure_*`), which do
//! race ahead of the ticket.

use crate::cursor::{Position, Target};
use crate::error::{ModifyError, ModifyResult};
use crate::gaplist::{GapPosition, Pred, MAXDEPTH};
use crate::insert::{random_height, InsertNode};
use crate::kv::{key_from_slice, ValueBytes};
use crate::page::LeafPage;
use crate::txn::TransactionContext;
use crate::update::UpdateNode;
use crossbeam::epoch::{Atomic, Guard, Owned, Shared};
use std::sync::atomic::Ordering;

/// The write a caller is applying: a new value, or a tombstone.
pub enum Write {
    Put(ValueBytes),
    Delete,
}

fn check_write_gen(page: &LeafPage, snapshot: u32) -> ModifyResult<()> {
    if page.write_gen() < snapshot {
        return Err(ModifyError::Restart);
    }
    Ok(())
}

/// Applies `write` to `key` at the position a prior `LeafPage::search` found,
/// dispatching to the update or insert path per SPEC_FULL §4.2/§4.3.
///
/// Generic over [`TransactionContext`] rather than tied to the crate's
/// [`crate::txn::SimpleTxnManager`] stand-in, per SPEC_FULL §6.
pub fn modify<'g, T: TransactionContext>(
    page: &LeafPage,
    key: &[u8],
    pos: Position<'g>,
    txn: &T,
    write: Write,
    guard: &'g Guard,
) -> ModifyResult<()> {
    let write_gen_snapshot = pos.write_gen_snapshot;
    match pos.target {
        Target::OnPage(slot) => {
            let entry = page.update_slot(slot, guard);
            modify_update(page, entry, txn, write, write_gen_snapshot, guard)
        }
        Target::Insert(node) => {
            let entry = &unsafe { node.as_ref() }.unwrap().upd;
            modify_update(page, entry, txn, write, write_gen_snapshot, guard)
        }
        Target::Gap(gap_pos) => modify_insert(page, pos.gap_index, key, gap_pos, txn, write, write_gen_snapshot, guard),
    }
}

fn modify_update<'g, T: TransactionContext>(
    page: &LeafPage,
    entry: &Atomic<UpdateNode>,
    txn: &T,
    write: Write,
    write_gen_snapshot: u32,
    guard: &'g Guard,
) -> ModifyResult<()> {
    let payload = match write {
        Write::Put(v) => Some(v),
        Write::Delete => None,
    };
    let payload_len = payload.as_ref().map_or(0, |p| p.len());
    let txn_id = txn.modify();
    let new_node = Owned::new(UpdateNode::new(txn_id, payload));

    let _ticket = page.ticket.lock();
    check_write_gen(page, write_gen_snapshot)?;

    let current = entry.load(Ordering::Acquire, guard);
    let current_txn = unsafe { current.as_ref() }.map(|n| n.txn_id);
    if txn.update_check(current_txn).is_err() {
        return Err(ModifyError::WriteConflict);
    }

    new_node.next.store(current, Ordering::Relaxed);
    std::sync::atomic::fence(Ordering::Release);
    entry.store(new_node, Ordering::Release);

    page.mark_dirty();
    page.write_gen_bump();
    page.mem_incr(payload_len + page.config.update_node_overhead_bytes);

    log::trace!("published update txn={} on page", txn_id);
    let freed = crate::collector::prune(entry, &|id| txn.visible_all(id), guard, &page.config);
    if freed > 0 {
        page.mem_decr(freed);
        log::debug!("obsolete collector freed {freed} bytes");
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn modify_insert<'g, T: TransactionContext>(
    page: &LeafPage,
    gap_index: usize,
    key: &[u8],
    mut gap_pos: GapPosition<'g>,
    txn: &T,
    write: Write,
    write_gen_snapshot: u32,
    guard: &'g Guard,
) -> ModifyResult<()> {
    let (gap_shared, freshly_allocated) = page.ensure_gap_head(gap_index, guard);
    let gap_list = unsafe { gap_shared.as_ref() }.unwrap();
    if freshly_allocated {
        // The cursor's predecessor stack was built against whatever was
        // observed before this gap had a list at all; a freshly created list
        // is empty, so every level's predecessor is the head and no next was
        // observed, per SPEC_FULL §4.3 step 2.
        gap_pos = GapPosition {
            prev: vec![Pred::Head; MAXDEPTH],
            next_observed: vec![None; MAXDEPTH],
            matched: None,
        };
    }

    let payload = match write {
        Write::Put(v) => Some(v),
        Write::Delete => None,
    };
    let payload_len = payload.as_ref().map_or(0, |p| p.len());
    let txn_id = txn.modify();
    let height = random_height(&page.rng, page.config.max_skiplist_height, page.config.branching_factor);
    let node = InsertNode::new(key_from_slice(key), UpdateNode::new(txn_id, payload), height);
    let overhead = node.overhead_len(page.config.insert_node_overhead_bytes);
    let owned = Owned::new(node);

    let _ticket = page.ticket.lock();
    check_write_gen(page, write_gen_snapshot)?;

    if !gap_list.validate(&gap_pos, height, guard) {
        return Err(ModifyError::Restart);
    }

    if txn.update_check(None).is_err() {
        return Err(ModifyError::WriteConflict);
    }

    let node_shared: Shared<'g, InsertNode> = owned.into_shared(guard);
    let node_ref = unsafe { node_shared.as_ref() }.unwrap();
    gap_list.publish(&gap_pos, node_ref, node_shared, guard);

    page.mark_dirty();
    page.write_gen_bump();
    page.mem_incr(overhead + payload_len);
    log::trace!("published insert txn={txn_id} into gap {gap_index}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeafConfig;
    use crate::kv::key_from_slice;
    use crate::txn::{Isolation, SimpleTxnManager, Transaction};
    use crossbeam::epoch;

    fn put(page: &LeafPage, key: &[u8], value: &[u8], txn: &Transaction) -> ModifyResult<()> {
        let guard = &epoch::pin();
        let pos = page.search(key, guard);
        modify(page, key, pos, txn, Write::Put(crate::kv::value_from_slice(value)), guard)
    }

    #[test]
    fn scenario_s1_two_inserts_on_empty_page() {
        let page = LeafPage::new(Vec::new(), LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let t1 = mgr.begin(Isolation::Snapshot);
        put(&page, b"A", b"1", &t1).unwrap();
        t1.commit();
        let t2 = mgr.begin(Isolation::Snapshot);
        put(&page, b"B", b"2", &t2).unwrap();
        t2.commit();

        let guard = &epoch::pin();
        let (gap, _) = page.ensure_gap_head(0, guard);
        let list = unsafe { gap.as_ref() }.unwrap();
        assert_eq!(list.iter_keys(guard), vec![b"A".to_vec(), b"B".to_vec()]);
    }

    #[test]
    fn scenario_s2_insert_between_existing_keys_preserves_order() {
        let page = LeafPage::new(Vec::new(), LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let t1 = mgr.begin(Isolation::Snapshot);
        put(&page, b"A", b"1", &t1).unwrap();
        t1.commit();
        let t3 = mgr.begin(Isolation::Snapshot);
        put(&page, b"C", b"3", &t3).unwrap();
        t3.commit();

        let guard = &epoch::pin();
        let pos1 = page.search(b"B", guard);
        let t_race = mgr.begin(Isolation::Snapshot);
        let r1 = modify(&page, b"B", pos1, &t_race, Write::Put(crate::kv::value_from_slice(b"b1")), guard);
        assert!(r1.is_ok());
        t_race.commit();

        let guard2 = &epoch::pin();
        let (gap, _) = page.ensure_gap_head(0, guard2);
        let list = unsafe { gap.as_ref() }.unwrap();
        assert_eq!(list.iter_keys(guard2), vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
    }

    #[test]
    fn scenario_s4_tombstone_insert_then_real_insert() {
        let page = LeafPage::new(Vec::new(), LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let t1 = mgr.begin(Isolation::Snapshot);
        let guard = &epoch::pin();
        let pos = page.search(b"Q", guard);
        modify(&page, b"Q", pos, &t1, Write::Delete, guard).unwrap();
        t1.commit();

        let guard2 = &epoch::pin();
        let pos2 = page.search(b"Q", guard2);
        let matched = match pos2.target {
            Target::Insert(n) => n,
            _ => panic!("expected the tombstone insert to be found"),
        };
        let node = unsafe { matched.as_ref() }.unwrap();
        let head = node.upd.load(Ordering::Acquire, guard2);
        assert!(unsafe { head.as_ref() }.unwrap().is_tombstone());
    }

    #[test]
    fn solo_writer_on_idle_page_never_restarts() {
        // property 7: a solo writer on an idle page never observes restart
        let page = LeafPage::new(Vec::new(), LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        for (i, k) in [b"A", b"B", b"C"].into_iter().enumerate() {
            let t = mgr.begin(Isolation::Snapshot);
            let result = put(&page, k, format!("v{i}").as_bytes(), &t);
            assert!(result.is_ok());
            t.commit();
        }
    }
}
