//! The per-thread worker loop and its supervising `Driver`
//!
//! Grounded directly on `test/format/ops.c`'s `ops()`: session/transaction
//! refresh, weighted op-type dice, the op itself, a verify-by-read of the key
//! just touched, a bounded random next/prev walk from that position (built on
//! `LeafMemTable::scan` since full cursor traversal above the leaf is out of
//! scope), then a commit/rollback/leave-open dice roll.

use crate::append_oracle::AppendOracle;
use crate::config::{DriverConfig, IsolationChoice};
use crate::stats::{WorkerStats, WorkerStatsSnapshot};
use ferrisdb_leaf::memtable::LeafMemTable;
use ferrisdb_leaf::txn::{Isolation, SimpleTxnManager, Transaction};
use ferrisdb_leaf::{LeafConfig, ModifyError};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "oracle")]
use crate::oracle::ReferenceStore;

fn pick_isolation(choice: IsolationChoice, rng: &mut impl Rng) -> Isolation {
    match choice {
        IsolationChoice::ReadUncommitted => Isolation::ReadUncommitted,
        IsolationChoice::ReadCommitted => Isolation::ReadCommitted,
        IsolationChoice::Snapshot => Isolation::Snapshot,
        IsolationChoice::Random => match rng.gen_range(0..3) {
            0 => Isolation::ReadUncommitted,
            1 => Isolation::ReadCommitted,
            _ => Isolation::Snapshot,
        },
    }
}

enum OpKind {
    Delete,
    Insert,
    Update,
    Search,
}

fn pick_op(cfg: &DriverConfig, rng: &mut impl Rng) -> OpKind {
    let roll = rng.gen_range(0..100u32);
    let delete = u32::from(cfg.delete_pct);
    let insert = delete + u32::from(cfg.insert_pct);
    let write = insert + u32::from(cfg.write_pct);
    if roll < delete {
        OpKind::Delete
    } else if roll < insert {
        OpKind::Insert
    } else if roll < write {
        OpKind::Update
    } else {
        OpKind::Search
    }
}

/// Shared state every worker and auxiliary thread sees.
pub struct Shared {
    pub table: LeafMemTable,
    pub txn_mgr: SimpleTxnManager,
    pub append: AppendOracle,
    pub backup_lock: RwLock<()>,
    pub stop: AtomicBool,
    /// Set on the first failed assertion (currently: an oracle mismatch).
    /// `main` exits non-zero when this is set, per SPEC_FULL §6.
    pub assertion_failed: AtomicBool,
    #[cfg(feature = "oracle")]
    pub reference: Option<ReferenceStore>,
}

fn key_bytes(n: u64) -> Vec<u8> {
    format!("{n:020}").into_bytes()
}

/// A small number (1-100) of next/prev steps in a random direction from the
/// cursor's current position, per SPEC_FULL §4.8 step 5. Grounded on
/// `nextprev` in the original format-test harness; standing in for a real
/// cursor's `next`/`prev` with a snapshot scan, since full cursor traversal
/// above the leaf is out of scope here.
fn walk_next_prev(table: &LeafMemTable, key: &[u8], positioned: bool, as_of_txn: u64, rng: &mut impl Rng) {
    if !positioned {
        return;
    }
    let forward = rng.gen_bool(0.5);
    let steps = rng.gen_range(1..=100u32);

    let snapshot = table.scan(as_of_txn);
    if snapshot.is_empty() {
        return;
    }
    let mut idx = match snapshot.binary_search_by(|(k, _)| k.as_slice().cmp(key)) {
        Ok(i) => i,
        Err(i) => i.min(snapshot.len() - 1),
    };

    for _ in 0..steps {
        if forward {
            if idx + 1 >= snapshot.len() {
                break;
            }
            idx += 1;
        } else {
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
    }

    let _ = table.get(&snapshot[idx].0, as_of_txn);
}

fn worker_loop(cfg: &DriverConfig, shared: &Shared, worker_id: usize, deadline: Option<Instant>) -> WorkerStatsSnapshot {
    let stats = WorkerStats::default();
    let mut rng = rand::thread_rng();
    let mut current_txn: Option<Transaction> = None;

    let mut done = 0u64;
    while done < cfg.ops && !shared.stop.load(Ordering::Relaxed) {
        if let Some(dl) = deadline {
            if Instant::now() >= dl {
                break;
            }
        }

        let txn = current_txn.take().unwrap_or_else(|| shared.txn_mgr.begin(pick_isolation(cfg.isolation, &mut rng)));

        let op = pick_op(cfg, &mut rng);
        let (outcome, op_key, positioned) = match op {
            OpKind::Insert => {
                let key_id = shared.append.reserve();
                let key = key_bytes(key_id);
                let value = format!("w{worker_id}-{key_id}").into_bytes();
                let r = shared.table.put(&key, &value, &txn);
                if r.is_ok() {
                    shared.append.complete(key_id);
                    stats.inserts.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "oracle")]
                    if let Some(r) = &shared.reference {
                        let _ = r.put(&key, &value);
                    }
                }
                // an insert resets the cursor, so there is nothing to walk from
                let positioned = false;
                (r, key, positioned)
            }
            OpKind::Delete => {
                let rows = shared.append.rows().max(1);
                let key_id = rng.gen_range(1..=rows);
                let key = key_bytes(key_id);
                let r = shared.table.delete(&key, &txn);
                if r.is_ok() {
                    stats.removes.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "oracle")]
                    if let Some(r) = &shared.reference {
                        let _ = r.delete(&key);
                    }
                }
                let positioned = r.is_ok();
                (r, key, positioned)
            }
            OpKind::Update => {
                let rows = shared.append.rows().max(1);
                let key_id = rng.gen_range(1..=rows);
                let key = key_bytes(key_id);
                let value = format!("u{worker_id}-{key_id}").into_bytes();
                let r = shared.table.put(&key, &value, &txn);
                if r.is_ok() {
                    stats.updates.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "oracle")]
                    if let Some(r) = &shared.reference {
                        let _ = r.put(&key, &value);
                    }
                }
                let positioned = r.is_ok();
                (r, key, positioned)
            }
            OpKind::Search => {
                let rows = shared.append.rows().max(1);
                let key_id = rng.gen_range(1..=rows);
                let key = key_bytes(key_id);
                let found = shared.table.get(&key, txn.id());
                stats.searches.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "oracle")]
                if let Some(r) = &shared.reference {
                    let flat = found.as_ref().and_then(|o| o.as_deref());
                    if let Err(msg) = r.check(&key, flat) {
                        log::error!("{msg}");
                        shared.assertion_failed.store(true, Ordering::Relaxed);
                    }
                }
                (Ok(()), key, true)
            }
        };

        if outcome.is_ok() {
            // verify by re-reading the same key, then a bounded next/prev walk
            // from that position (SPEC_FULL §4.8 step 5)
            let _ = shared.table.get(&op_key, txn.id());
            walk_next_prev(&shared.table, &op_key, positioned, txn.id(), &mut rng);
        }

        match outcome {
            Ok(()) => {
                let roll = rng.gen_range(0..100u32);
                if roll < 40 {
                    txn.commit();
                    stats.commits.fetch_add(1, Ordering::Relaxed);
                } else if roll < 50 {
                    txn.rollback();
                    stats.rollbacks.fetch_add(1, Ordering::Relaxed);
                } else {
                    current_txn = Some(txn);
                }
            }
            Err(ModifyError::Restart) => {
                current_txn = Some(txn);
                continue;
            }
            Err(ModifyError::WriteConflict) => {
                txn.rollback();
                stats.deadlocks.fetch_add(1, Ordering::Relaxed);
            }
            Err(ModifyError::Alloc(e)) => {
                txn.rollback();
                log::warn!("allocation failure: {e}");
            }
        }

        done += 1;
    }

    if let Some(txn) = current_txn {
        txn.commit();
    }

    stats.snapshot()
}

fn checkpoint_loop(shared: &Shared, period: Duration) {
    while !shared.stop.load(Ordering::Relaxed) {
        thread::sleep(period);
        let _guard = shared.backup_lock.write();
        let mgr = &shared.txn_mgr;
        let freed = shared.table.prune_obsolete(&|id| mgr.visible_all(id));
        log::debug!("checkpoint pruned {freed} bytes");
    }
}

fn long_running_reader_loop(shared: &Shared, rows_hint: u64) {
    let mut rng = rand::thread_rng();
    while !shared.stop.load(Ordering::Relaxed) {
        let txn = shared.txn_mgr.begin(Isolation::Snapshot);
        let rows = shared.append.rows().max(1).min(rows_hint.max(1));
        for _ in 0..10 {
            if shared.stop.load(Ordering::Relaxed) {
                break;
            }
            let key_id = rng.gen_range(1..=rows);
            let _ = shared.table.get(&key_bytes(key_id), txn.id());
            thread::sleep(Duration::from_millis(5));
        }
        txn.commit();
    }
}

/// Seeds, runs, and joins the configured worker/checkpoint/reader threads.
pub struct Driver {
    cfg: DriverConfig,
}

impl Driver {
    pub fn new(cfg: DriverConfig) -> Self {
        Self { cfg }
    }

    pub fn run(self) -> RunResult {
        let cfg = self.cfg;
        let table = LeafMemTable::new(LeafConfig::default());
        let txn_mgr = SimpleTxnManager::new();

        {
            let seed_txn = txn_mgr.begin(Isolation::Snapshot);
            for i in 1..=cfg.rows {
                table.put(&key_bytes(i), format!("seed-{i}").as_bytes(), &seed_txn).ok();
            }
            seed_txn.commit();
        }

        #[cfg(feature = "oracle")]
        let reference = if cfg.oracle {
            let store = ReferenceStore::open_in_memory().expect("oracle store");
            for i in 1..=cfg.rows {
                store.put(&key_bytes(i), format!("seed-{i}").as_bytes()).ok();
            }
            Some(store)
        } else {
            None
        };

        let shared = Arc::new(Shared {
            table,
            txn_mgr,
            append: AppendOracle::new(cfg.rows),
            backup_lock: RwLock::new(()),
            stop: AtomicBool::new(false),
            assertion_failed: AtomicBool::new(false),
            #[cfg(feature = "oracle")]
            reference,
        });

        let deadline = cfg.timer.map(|minutes| Instant::now() + Duration::from_secs(minutes * 60));

        let mut handles = Vec::new();
        for worker_id in 0..cfg.threads {
            let shared = shared.clone();
            let cfg = cfg.clone();
            handles.push(thread::spawn(move || worker_loop(&cfg, &shared, worker_id, deadline)));
        }

        let aux_stop = shared.clone();
        let checkpoint_handle = cfg.checkpoints.then(|| {
            let shared = aux_stop.clone();
            thread::spawn(move || checkpoint_loop(&shared, Duration::from_millis(250)))
        });

        let reader_handle = cfg.long_running_txn.then(|| {
            let shared = shared.clone();
            let rows = cfg.rows;
            thread::spawn(move || long_running_reader_loop(&shared, rows))
        });

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        shared.stop.store(true, Ordering::Relaxed);
        if let Some(h) = checkpoint_handle {
            h.join().unwrap();
        }
        if let Some(h) = reader_handle {
            h.join().unwrap();
        }

        RunResult {
            stats: results,
            assertion_failed: shared.assertion_failed.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of a completed run: per-worker stats plus whether any assertion
/// (currently: an oracle-comparison mismatch) failed during the run. `main`
/// uses `assertion_failed` to decide the process exit code per SPEC_FULL §6.
pub struct RunResult {
    pub stats: Vec<WorkerStatsSnapshot>,
    pub assertion_failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_mixed_workload_completes_without_panicking() {
        let cfg = DriverConfig {
            rows: 50,
            threads: 4,
            ops: 200,
            timer: None,
            delete_pct: 10,
            insert_pct: 20,
            write_pct: 30,
            checkpoints: true,
            isolation: IsolationChoice::Random,
            long_running_txn: true,
            shape: crate::config::StoreShape::Row,
            oracle: false,
        };
        cfg.validate().unwrap();
        let outcome = Driver::new(cfg).run();
        let total: u64 = outcome.stats.iter().map(|r| r.total_ops()).sum();
        assert!(total > 0);
        assert!(!outcome.assertion_failed);
    }
}
