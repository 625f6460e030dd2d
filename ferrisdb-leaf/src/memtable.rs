//! MemTable as the degenerate zero-on-page-key leaf (`N = 0`)
//!
//! A single gap (gap 0) anchors every inserted key; there is nothing else to
//! a MemTable once it is expressed in terms of [`LeafPage`]. This is the
//! adapter `ferrisdb_storage::memtable::MemTable` is rebuilt against.

use crate::config::LeafConfig;
use crate::cursor::Target;
use crate::kv::ValueBytes;
use crate::page::LeafPage;
use crate::serialize::{self, Write};
use crate::txn::Transaction;
use crate::ModifyResult;
use crossbeam::epoch;
use std::sync::atomic::Ordering;

/// A write buffer with no on-page keys: every key lives in gap 0.
pub struct LeafMemTable {
    page: LeafPage,
}

impl LeafMemTable {
    pub fn new(config: LeafConfig) -> Self {
        Self { page: LeafPage::new(Vec::new(), config) }
    }

    /// Writes `value` for `key` under `txn`.
    pub fn put(&self, key: &[u8], value: &[u8], txn: &Transaction) -> ModifyResult<()> {
        let guard = &epoch::pin();
        let pos = self.page.search(key, guard);
        serialize::modify(&self.page, key, pos, txn, Write::Put(crate::kv::value_from_slice(value)), guard)
    }

    /// Marks `key` deleted (tombstoned) under `txn`.
    pub fn delete(&self, key: &[u8], txn: &Transaction) -> ModifyResult<()> {
        let guard = &epoch::pin();
        let pos = self.page.search(key, guard);
        serialize::modify(&self.page, key, pos, txn, Write::Delete, guard)
    }

    /// Returns the version of `key` visible as of `as_of_txn`: `Some(None)`
    /// for a tombstone, `Some(Some(value))` for a live value, `None` if the
    /// key has no version visible at or before `as_of_txn`.
    pub fn get(&self, key: &[u8], as_of_txn: u64) -> Option<Option<ValueBytes>> {
        let guard = &epoch::pin();
        let pos = self.page.search(key, guard);
        let node = match pos.target {
            Target::Insert(n) => n,
            _ => return None,
        };
        let insert = unsafe { node.as_ref() }.unwrap();
        let mut curr = insert.upd.load(Ordering::Acquire, guard);
        while let Some(u) = unsafe { curr.as_ref() } {
            if u.txn_id <= as_of_txn {
                return Some(u.payload.clone());
            }
            curr = u.next.load(Ordering::Acquire, guard);
        }
        None
    }

    /// All keys with a version visible as of `as_of_txn`, in ascending order.
    /// Tombstoned keys are included with a `None` value.
    pub fn scan(&self, as_of_txn: u64) -> Vec<(Vec<u8>, Option<ValueBytes>)> {
        let guard = &epoch::pin();
        let (gap, _) = self.page.ensure_gap_head(0, guard);
        let list = unsafe { gap.as_ref() }.unwrap();
        list.nodes(guard)
            .into_iter()
            .filter_map(|n| {
                let insert = unsafe { n.as_ref() }.unwrap();
                let mut curr = insert.upd.load(Ordering::Acquire, guard);
                while let Some(u) = unsafe { curr.as_ref() } {
                    if u.txn_id <= as_of_txn {
                        return Some((insert.key.to_vec(), u.payload.clone()));
                    }
                    curr = u.next.load(Ordering::Acquire, guard);
                }
                None
            })
            .collect()
    }

    pub fn mem_usage(&self) -> usize {
        self.page.mem_usage()
    }

    /// Sweeps every key's version chain for obsolete tails.
    pub fn prune_obsolete(&self, visible_all: &dyn Fn(u64) -> bool) -> usize {
        self.page.prune_obsolete(visible_all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::{Isolation, SimpleTxnManager};

    #[test]
    fn put_then_get_round_trips() {
        let table = LeafMemTable::new(LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let t = mgr.begin(Isolation::Snapshot);
        table.put(b"key1", b"value1", &t).unwrap();
        let id = t.id();
        t.commit();

        let result = table.get(b"key1", id);
        assert_eq!(result, Some(Some(crate::kv::value_from_slice(b"value1"))));
    }

    #[test]
    fn delete_produces_tombstone() {
        let table = LeafMemTable::new(LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let t1 = mgr.begin(Isolation::Snapshot);
        table.put(b"key1", b"value1", &t1).unwrap();
        let id1 = t1.id();
        t1.commit();

        let t2 = mgr.begin(Isolation::Snapshot);
        table.delete(b"key1", &t2).unwrap();
        let id2 = t2.id();
        t2.commit();

        assert_eq!(table.get(b"key1", id1), Some(Some(crate::kv::value_from_slice(b"value1"))));
        assert_eq!(table.get(b"key1", id2), Some(None));
    }

    #[test]
    fn scan_returns_keys_in_order() {
        let table = LeafMemTable::new(LeafConfig::default());
        let mgr = SimpleTxnManager::new();
        let mut last_id = 0;
        for (k, v) in [(b"b", b"2"), (b"a", b"1"), (b"c", b"3")] {
            let t = mgr.begin(Isolation::Snapshot);
            table.put(k, v, &t).unwrap();
            last_id = t.id();
            t.commit();
        }
        let results = table.scan(last_id);
        let keys: Vec<_> = results.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }
}
