//! SSTable writer implementation

/// Writer for creating SSTable files
///
/// The SSTableWriter creates immutable SSTable files from sorted key-value
/// pairs, typically from a flushed MemTable. It handles block creation,
/// compression, and index generation.
///
/// # Example
///
/// ```ignore
/// use ferrisdb_storage::sstable::writer::SSTableWriter;
///
/// // TODO: Implement SSTableWriter
/// // let mut writer = SSTableWriter::new("path/to/sstable.sst")?;
/// // writer.add(b"key", b"value")?;
/// // writer.finish()?;
/// ```
pub struct SSTableWriter {
    // TODO: Add fields for:
    // - File handle
    // - Current block buffer
    // - Index entries
    // - Bloom filter builder
    // - Compression settings
}
