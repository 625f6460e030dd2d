//! Tuning parameters for the leaf page mutation core

/// Configuration for a [`LeafPage`](crate::page::LeafPage) and its skip lists.
///
/// Mirrors the shape of `ferrisdb_storage::StorageConfig`: a plain struct
/// with a `Default` impl, threaded through at construction time rather than
/// read from globals.
#[derive(Debug, Clone)]
pub struct LeafConfig {
    /// Maximum height a skip-list node may be assigned. Bounds `MAXDEPTH`.
    pub max_skiplist_height: usize,

    /// Denominator of the geometric height distribution (`P(level up) = 1/branching_factor`).
    pub branching_factor: u32,

    /// Fixed per-record overhead charged against `mem_usage` for every update node,
    /// on top of its payload length, approximating header + pointer cost.
    pub update_node_overhead_bytes: usize,

    /// Fixed per-record overhead charged against `mem_usage` for every insert node,
    /// on top of its key length and forward-pointer array.
    pub insert_node_overhead_bytes: usize,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self {
            max_skiplist_height: 17,
            branching_factor: 4,
            update_node_overhead_bytes: 24,
            insert_node_overhead_bytes: 32,
        }
    }
}
