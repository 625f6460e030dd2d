//! Mixed insert/update/remove/search workload driver binary
//!
//! Seeds a [`ferrisdb_leaf::memtable::LeafMemTable`], runs the configured
//! number of worker threads plus optional checkpoint and long-running-reader
//! threads, and reports aggregate per-operation counters on exit.

mod append_oracle;
mod config;
mod driver;
mod stats;

#[cfg(feature = "oracle")]
mod oracle;

use clap::Parser;
use config::DriverConfig;
use driver::Driver;
use stats::WorkerStatsSnapshot;

fn main() {
    env_logger::init();

    let cfg = DriverConfig::parse();
    if let Err(e) = cfg.validate() {
        eprintln!("invalid configuration: {e}");
        std::process::exit(2);
    }

    log::info!(
        "starting workload: rows={} threads={} ops={} delete_pct={} insert_pct={} write_pct={}",
        cfg.rows, cfg.threads, cfg.ops, cfg.delete_pct, cfg.insert_pct, cfg.write_pct
    );

    let outcome = Driver::new(cfg).run();

    let total = outcome
        .stats
        .into_iter()
        .fold(WorkerStatsSnapshot::default(), |acc, s| acc + s);

    log::info!(
        "done: commits={} rollbacks={} deadlocks={} inserts={} removes={} updates={} searches={}",
        total.commits, total.rollbacks, total.deadlocks, total.inserts, total.removes, total.updates, total.searches,
    );

    println!(
        "commits={} rollbacks={} deadlocks={} inserts={} removes={} updates={} searches={} total_ops={}",
        total.commits,
        total.rollbacks,
        total.deadlocks,
        total.inserts,
        total.removes,
        total.updates,
        total.searches,
        total.total_ops(),
    );

    if outcome.assertion_failed {
        eprintln!("FAILED: oracle comparison mismatch during run, see log");
        std::process::exit(1);
    }
}
