//! SSTable reader implementation

/// Reader for accessing SSTable files
///
/// The SSTableReader provides efficient access to key-value pairs stored
/// in SSTable files. It uses the index for binary search and can leverage
/// bloom filters to avoid unnecessary disk reads.
///
/// # Example
///
/// ```ignore
/// use ferrisdb_storage::sstable::reader::SSTableReader;
///
/// // TODO: Implement SSTableReader
/// // let reader = SSTableReader::open("path/to/sstable.sst")?;
/// // let value = reader.get(b"key")?;
/// ```
pub struct SSTableReader {
    // TODO: Add fields for:
    // - File handle or memory map
    // - Index cache
    // - Bloom filter
    // - Block cache reference
    // - File metadata
}
