//! Leaf page mutation core
//!
//! Implements the in-memory row-store mutation core of a B-tree-based
//! embedded key/value engine: a concurrent ordered skip list per gap on a
//! leaf page, a per-key MVCC version chain, and the serialization step and
//! obsolete collector that coordinate them without quiescing readers.
//!
//! # Architecture
//!
//! ```text
//! LeafPage
//!   ├── updates[0..N)   -- version-chain head per on-page key   (component B)
//!   └── gaps[0..=N]     -- skip-list head per gap               (component D)
//!         └── InsertNode -- new key, owns its own version chain (component C)
//!
//! modify(page, position, txn, write) -> component F validates + publishes
//! page.prune_obsolete(visible_all)    -> component G sweeps every chain
//! ```
//!
//! On-disk page format, eviction, write-ahead logging, checkpoints, and
//! B-tree traversal above the leaf are out of scope; this crate's `LeafPage`
//! is constructed directly over an already-decoded, immutable, sorted slice
//! of on-page keys.

pub mod collector;
pub mod config;
pub mod cursor;
pub mod error;
pub mod gaplist;
pub mod insert;
pub mod kv;
pub mod memtable;
pub mod page;
pub mod serialize;
pub mod txn;
pub mod update;

pub use config::LeafConfig;
pub use cursor::{Position, Target};
pub use error::{ModifyError, ModifyResult};
pub use page::LeafPage;
pub use serialize::{modify, Write};
pub use txn::{Isolation, SimpleTxnManager, Transaction, TransactionContext};
