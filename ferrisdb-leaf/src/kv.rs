//! Immutable byte buffers owned by the node that carries them

/// Immutable key bytes, owned by the insert node (or on-page slot) that carries them.
pub type KeyBytes = Box<[u8]>;

/// Immutable value bytes, owned by the update node that carries them.
pub type ValueBytes = Box<[u8]>;

/// Builds owned key bytes from a borrowed slice.
pub fn key_from_slice(key: &[u8]) -> KeyBytes {
    key.to_vec().into_boxed_slice()
}

/// Builds owned value bytes from a borrowed slice.
pub fn value_from_slice(value: &[u8]) -> ValueBytes {
    value.to_vec().into_boxed_slice()
}
