//! Error types for the magnon-store crate.

use std::path::PathBuf;

/// Error type for all fallible operations in the magnon-store crate.
///
/// Every variant that concerns a specific entry carries the entry name so
/// a caller can decide whether to delete-and-retry or re-ingest.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Returned when the container hierarchy does not exist on disk.
    #[error("container not found at {path}")]
    ContainerNotFound {
        /// Path that was probed.
        path: PathBuf,
    },

    /// Returned when the container exists but cannot be opened or created.
    #[error("failed to open container at {path}: {reason}")]
    Container {
        /// Container path.
        path: PathBuf,
        /// Backend failure description.
        reason: String,
    },

    /// Returned when a named dataset or attribute target is absent.
    #[error("no dataset named '{name}'")]
    KeyNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// Returned when a write or move collides with an existing entry.
    #[error("dataset '{name}' already exists, pass override to replace it")]
    AlreadyExists {
        /// Colliding entry name.
        name: String,
    },

    /// Returned when an attribute key is absent on the requested target.
    #[error("no attribute '{key}' on {target}")]
    AttributeNotFound {
        /// Attribute key.
        key: String,
        /// `"root"` or the array name.
        target: String,
    },

    /// Returned when an attribute exists but is not of the requested type.
    #[error("attribute '{key}' on {target} is not a number")]
    AttributeType {
        /// Attribute key.
        key: String,
        /// `"root"` or the array name.
        target: String,
    },

    /// Returned when a selection has more axes than the array.
    #[error("selection for '{name}' has {got} axes but the array has rank {rank}")]
    SelectionRank {
        /// Array name.
        name: String,
        /// Number of axes in the selection.
        got: usize,
        /// Rank of the array.
        rank: usize,
    },

    /// Returned when a selection reaches past the end of an axis.
    #[error("selection {start}..{end} on axis {axis} of '{name}' is out of bounds for length {len}")]
    SelectionOutOfBounds {
        /// Array name.
        name: String,
        /// Offending axis.
        axis: usize,
        /// Selection start.
        start: usize,
        /// Selection end (exclusive).
        end: usize,
        /// Axis length.
        len: usize,
    },

    /// Returned when a selection resolves to zero elements on an axis.
    #[error("empty selection on axis {axis} of '{name}'")]
    EmptySelection {
        /// Array name.
        name: String,
        /// Offending axis.
        axis: usize,
    },

    /// Returned when a slab does not match the frame shape of its dataset.
    #[error("slab shape {got:?} does not match frame shape {expected:?} of '{name}'")]
    SlabShape {
        /// Dataset name.
        name: String,
        /// Expected per-frame shape.
        expected: Vec<usize>,
        /// Shape that was supplied.
        got: Vec<usize>,
    },

    /// Returned when an entry is present but its metadata or chunks are
    /// unreadable, typically after an interrupted write.
    #[error("entry '{name}' is unreadable: {reason}")]
    CorruptEntry {
        /// Entry name.
        name: String,
        /// Backend failure description.
        reason: String,
    },

    /// Returned when a name cannot be used as a storage key.
    #[error("invalid entry name '{name}'")]
    InvalidName {
        /// Rejected name.
        name: String,
    },

    /// Array-level backend failure during a read or write.
    #[error("array operation on '{name}' failed: {source}")]
    Array {
        /// Entry name.
        name: String,
        /// Underlying zarrs error.
        source: zarrs::array::ArrayError,
    },

    /// Raw storage backend failure.
    #[error("storage error: {0}")]
    Storage(#[from] zarrs::storage::StorageError),

    /// Filesystem failure outside the storage backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_key_not_found() {
        let err = StoreError::KeyNotFound { name: "m".into() };
        assert_eq!(err.to_string(), "no dataset named 'm'");
    }

    #[test]
    fn error_already_exists() {
        let err = StoreError::AlreadyExists {
            name: "fft/m/arr".into(),
        };
        assert_eq!(
            err.to_string(),
            "dataset 'fft/m/arr' already exists, pass override to replace it"
        );
    }

    #[test]
    fn error_out_of_bounds() {
        let err = StoreError::SelectionOutOfBounds {
            name: "m".into(),
            axis: 3,
            start: 0,
            end: 80,
            len: 64,
        };
        assert_eq!(
            err.to_string(),
            "selection 0..80 on axis 3 of 'm' is out of bounds for length 64"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<StoreError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<StoreError>();
    }
}
