//! Minimal transaction-manager stand-in
//!
//! SPEC_FULL §1 and §6 name three interfaces the mutation core consumes from
//! an external transaction manager (`update_check`, `modify`/`unmodify`,
//! `visible_all`) without specifying that manager's own design, since it is
//! out of scope. This module is the documented Open Question resolution: a
//! minimal in-crate provider, not a full transaction manager, sufficient to
//! drive and test the core.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Isolation level a transaction runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadUncommitted,
    ReadCommitted,
    Snapshot,
}

struct Inner {
    next_txn_id: AtomicU64,
    active: Mutex<BTreeSet<u64>>,
}

/// Allocates monotonic transaction ids, tracks which are still active, and
/// answers `visible_all` via the low-water mark among active transactions.
#[derive(Clone)]
pub struct SimpleTxnManager {
    inner: Arc<Inner>,
}

impl SimpleTxnManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_txn_id: AtomicU64::new(1),
                active: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Begins a transaction, allocating a fresh id and marking it active.
    pub fn begin(&self, isolation: Isolation) -> Transaction {
        let id = self.inner.next_txn_id.fetch_add(1, Ordering::Relaxed);
        self.inner.active.lock().insert(id);
        Transaction {
            manager: self.clone(),
            id,
            isolation,
            done: false,
        }
    }

    /// Whether `txn_id` is still an in-flight writer.
    pub fn is_active(&self, txn_id: u64) -> bool {
        self.inner.active.lock().contains(&txn_id)
    }

    /// Every live snapshot can observe a version written at `txn_id` once no
    /// active transaction holds an id at or below it.
    pub fn visible_all(&self, txn_id: u64) -> bool {
        match self.inner.active.lock().iter().next() {
            None => true,
            Some(&low) => txn_id < low,
        }
    }

    fn retire(&self, txn_id: u64) {
        self.inner.active.lock().remove(&txn_id);
    }
}

impl Default for SimpleTxnManager {
    fn default() -> Self {
        Self::new()
    }
}

/// The interface `serialize::modify` consumes from a transaction manager:
/// §1 and §6's `update_check`, `modify`/`unmodify`, and `visible_all`,
/// gathered as a trait so the serialization step is written against the
/// interface rather than the concrete [`Transaction`] stand-in.
pub trait TransactionContext {
    /// Assigns (returns) the transaction id a write should carry.
    fn modify(&self) -> u64;
    /// Whether a write against a slot whose current head carries
    /// `current_head_txn` may proceed under this transaction's isolation.
    fn update_check(&self, current_head_txn: Option<u64>) -> Result<(), ()>;
    /// Whether `txn_id` is visible to every live transaction's snapshot.
    fn visible_all(&self, txn_id: u64) -> bool;
}

/// A single in-flight transaction handle.
///
/// `update_check` implements first-committer-wins under snapshot isolation:
/// a write against a slot whose current head belongs to another still-active
/// transaction conflicts. Read-uncommitted and read-committed sessions never
/// hold a snapshot that could be invalidated, so they never conflict here.
pub struct Transaction {
    manager: SimpleTxnManager,
    id: u64,
    isolation: Isolation,
    done: bool,
}

impl Transaction {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    /// `modify()` from SPEC_FULL §6: assigns (returns) the id this write
    /// should carry. For this stand-in, that is simply the transaction's own
    /// id; every write within one transaction shares it.
    pub fn modify(&self) -> u64 {
        self.id
    }

    /// Checks whether a write against a slot whose current head carries
    /// `current_head_txn` may proceed.
    pub fn update_check(&self, current_head_txn: Option<u64>) -> Result<(), ()> {
        match self.isolation {
            Isolation::ReadUncommitted | Isolation::ReadCommitted => Ok(()),
            Isolation::Snapshot => match current_head_txn {
                None => Ok(()),
                Some(h) if h == self.id => Ok(()),
                Some(h) if self.manager.is_active(h) => Err(()),
                Some(_) => Ok(()),
            },
        }
    }

    /// Whether `txn_id` is visible to every live transaction's snapshot.
    pub fn visible_all(&self, txn_id: u64) -> bool {
        self.manager.visible_all(txn_id)
    }

    /// Commits, releasing this transaction's hold on the low-water mark.
    pub fn commit(mut self) {
        self.done = true;
        self.manager.retire(self.id);
    }

    /// Rolls back. The stand-in manager does not track per-write undo
    /// records (see DESIGN.md); callers are expected to use `unmodify`-style
    /// cleanup at the call site for any write not yet published.
    pub fn rollback(mut self) {
        self.done = true;
        self.manager.retire(self.id);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.done {
            self.manager.retire(self.id);
        }
    }
}

impl TransactionContext for Transaction {
    fn modify(&self) -> u64 {
        Transaction::modify(self)
    }

    fn update_check(&self, current_head_txn: Option<u64>) -> Result<(), ()> {
        Transaction::update_check(self, current_head_txn)
    }

    fn visible_all(&self, txn_id: u64) -> bool {
        Transaction::visible_all(self, txn_id)
    }
}
