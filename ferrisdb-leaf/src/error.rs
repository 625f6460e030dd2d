//! Error types for the leaf page mutation core

use thiserror::Error;

/// Outcome of a failed `modify` call.
///
/// `Restart` and `WriteConflict` are both routine control-flow signals
/// rather than faults: a caller retries on `Restart` after re-positioning
/// its cursor, and aborts the current transaction on `WriteConflict`.
#[derive(Error, Debug)]
pub enum ModifyError {
    /// The writer's observed position went stale before it could publish.
    /// The caller must re-run positioning and retry the whole operation.
    #[error("stale position, retry")]
    Restart,

    /// The current version is not visible to, or is locked by, another
    /// in-flight transaction. The caller's transaction must roll back.
    #[error("write conflict")]
    WriteConflict,

    /// Propagated from an underlying allocation or accounting failure.
    #[error("allocation failed: {0}")]
    Alloc(#[from] ferrisdb_core::Error),
}

/// Result type used throughout the mutation core.
pub type ModifyResult<T> = std::result::Result<T, ModifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_variant_converts_from_core_error_and_displays_it() {
        let core_err = ferrisdb_core::Error::InvalidOperation("disk full".to_string());
        let err: ModifyError = core_err.into();
        assert_eq!(err.to_string(), "allocation failed: Invalid operation: disk full");
    }

    #[test]
    fn restart_and_write_conflict_are_distinct_variants() {
        assert_eq!(ModifyError::Restart.to_string(), "stale position, retry");
        assert_eq!(ModifyError::WriteConflict.to_string(), "write conflict");
    }
}
