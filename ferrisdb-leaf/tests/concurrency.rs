//! Multi-threaded stress coverage for the leaf mutation core (property 8 /
//! scenario S2's genuine race, bounded to a size a unit-test run should
//! finish quickly; the unbounded version lives in `ferrisdb-workload`).

use ferrisdb_leaf::memtable::LeafMemTable;
use ferrisdb_leaf::txn::{Isolation, SimpleTxnManager};
use ferrisdb_leaf::LeafConfig;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_inserts_from_many_threads_preserve_order_and_count() {
    let _ = env_logger::try_init();
    let table = Arc::new(LeafMemTable::new(LeafConfig::default()));
    let mgr = Arc::new(SimpleTxnManager::new());
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let table = table.clone();
            let mgr = mgr.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let key = format!("{:04}-{:03}", i, t);
                    loop {
                        let txn = mgr.begin(Isolation::Snapshot);
                        match table.put(key.as_bytes(), b"v", &txn) {
                            Ok(()) => {
                                txn.commit();
                                break;
                            }
                            Err(ferrisdb_leaf::ModifyError::Restart) => {
                                txn.rollback();
                                continue;
                            }
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let snapshot = mgr.begin(Isolation::Snapshot);
    let results = table.scan(snapshot.id());
    snapshot.commit();

    assert_eq!(results.len(), THREADS * PER_THREAD);
    let mut sorted = results.clone();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(results.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>(),
               sorted.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>());
}

#[test]
fn concurrent_updates_to_the_same_key_leave_one_consistent_winner() {
    let table = Arc::new(LeafMemTable::new(LeafConfig::default()));
    let mgr = Arc::new(SimpleTxnManager::new());

    {
        let txn = mgr.begin(Isolation::Snapshot);
        table.put(b"shared", b"initial", &txn).unwrap();
        txn.commit();
    }

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let table = table.clone();
            let mgr = mgr.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    loop {
                        let txn = mgr.begin(Isolation::ReadCommitted);
                        let value = format!("writer-{t}");
                        match table.put(b"shared", value.as_bytes(), &txn) {
                            Ok(()) => {
                                txn.commit();
                                break;
                            }
                            Err(ferrisdb_leaf::ModifyError::Restart) => {
                                txn.rollback();
                                continue;
                            }
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let snapshot = mgr.begin(Isolation::Snapshot);
    let final_value = table.get(b"shared", snapshot.id());
    snapshot.commit();
    assert!(final_value.is_some());
}
