//! Driver configuration, matching every other `ferrisdb-*` binary's `clap` CLI

use clap::{Parser, ValueEnum};

/// Row-store or column-store shape requested on the CLI. Only `Row` is
/// implemented; the other two are accepted for configuration-surface parity
/// with the original driver and rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreShape {
    Row,
    FixedColumn,
    VariableColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IsolationChoice {
    ReadUncommitted,
    ReadCommitted,
    Snapshot,
    Random,
}

/// Mixed insert/update/remove/search workload driver for the leaf mutation core.
#[derive(Debug, Parser, Clone)]
#[command(name = "ferrisdb-workload", version, about)]
pub struct DriverConfig {
    /// Number of on-page/gap keys the table is seeded with before the run starts.
    #[arg(long, default_value_t = 1_000)]
    pub rows: u64,

    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    /// Per-thread operation budget. Mutually exclusive with `--timer` in spirit
    /// (both may be set; whichever condition hits first ends the run).
    #[arg(long, default_value_t = 50_000)]
    pub ops: u64,

    /// Alternative to `--ops`: run for this many minutes instead of a fixed budget.
    #[arg(long)]
    pub timer: Option<u64>,

    /// Percentage chance (0-100) an iteration performs a delete.
    #[arg(long, default_value_t = 10)]
    pub delete_pct: u8,

    /// Percentage chance (0-100) an iteration performs an insert.
    #[arg(long, default_value_t = 20)]
    pub insert_pct: u8,

    /// Percentage chance (0-100) an iteration performs an update.
    /// The remainder (100 - delete - insert - write) is search.
    #[arg(long, default_value_t = 30)]
    pub write_pct: u8,

    /// Enable the periodic checkpoint thread.
    #[arg(long, default_value_t = true)]
    pub checkpoints: bool,

    /// Isolation level new transactions are drawn from.
    #[arg(long, value_enum, default_value_t = IsolationChoice::Random)]
    pub isolation: IsolationChoice,

    /// Enable the long-running background reader thread.
    #[arg(long, default_value_t = true)]
    pub long_running_txn: bool,

    /// Store shape. Only `row` is implemented.
    #[arg(long, value_enum, default_value_t = StoreShape::Row)]
    pub shape: StoreShape,

    /// Enable the external reference-store oracle (requires the `oracle` feature,
    /// and forces `threads = 1` since the reference store has no concurrency story).
    #[arg(long, default_value_t = false)]
    pub oracle: bool,
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.shape != StoreShape::Row {
            return Err(format!("{:?} is not supported by this core", self.shape));
        }
        if u16::from(self.delete_pct) + u16::from(self.insert_pct) + u16::from(self.write_pct) > 100 {
            return Err("delete_pct + insert_pct + write_pct must not exceed 100".to_string());
        }
        if self.oracle && self.threads != 1 {
            return Err("--oracle requires --threads 1".to_string());
        }
        Ok(())
    }
}
