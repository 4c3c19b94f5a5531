//! Error types for the magnon-lazy crate.

use magnon_store::StoreError;

/// Error type for graph composition and execution.
#[derive(Debug, thiserror::Error)]
pub enum LazyError {
    /// Returned when an operation's input shapes are incompatible.
    #[error("{op}: shape mismatch, array is {lhs:?} but operand is {rhs:?}")]
    ShapeMismatch {
        /// Operation that was composed.
        op: &'static str,
        /// Shape of the array at this point in the graph.
        lhs: Vec<usize>,
        /// Shape of the operand (or requested shape).
        rhs: Vec<usize>,
    },

    /// Returned when an operation targets an axis outside the array's rank.
    #[error("{op}: axis {axis} is out of range for rank {rank}")]
    UnsupportedAxis {
        /// Operation that was composed.
        op: &'static str,
        /// Requested axis.
        axis: usize,
        /// Rank of the array at this point in the graph.
        rank: usize,
    },

    /// Returned when a frame index reaches past the end of its axis.
    #[error("{op}: index {index} is out of bounds for axis of length {len}")]
    IndexOutOfBounds {
        /// Operation that was composed.
        op: &'static str,
        /// Requested index.
        index: usize,
        /// Axis length.
        len: usize,
    },

    /// Returned when a slice resolves to zero elements.
    #[error("{op}: empty selection on axis {axis}")]
    EmptySelection {
        /// Operation that was composed.
        op: &'static str,
        /// Offending axis.
        axis: usize,
    },

    /// Returned when `select` is applied after other operations.
    #[error("select must be the first operation on a lazy array")]
    LateSelect,

    /// Returned when an operation requires the other element kind, e.g.
    /// `rfft` on an already-complex array.
    #[error("{op}: expected a {expected} array")]
    WrongKind {
        /// Operation that was composed or evaluated.
        op: &'static str,
        /// `"real"` or `"complex"`.
        expected: &'static str,
    },

    /// Failure while reading from the backing store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape_mismatch() {
        let err = LazyError::ShapeMismatch {
            op: "mul",
            lhs: vec![4, 8],
            rhs: vec![3],
        };
        assert_eq!(
            err.to_string(),
            "mul: shape mismatch, array is [4, 8] but operand is [3]"
        );
    }

    #[test]
    fn error_unsupported_axis() {
        let err = LazyError::UnsupportedAxis {
            op: "sum",
            axis: 5,
            rank: 3,
        };
        assert_eq!(err.to_string(), "sum: axis 5 is out of range for rank 3");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<LazyError>();
    }
}
