//! Transform-level errors.

use thiserror::Error;

use magnon_lazy::LazyError;
use magnon_store::StoreError;

/// Errors raised by the spectral transforms.
#[derive(Debug, Error)]
pub enum SpectralError {
    /// A cached result is already present and `override` was not requested.
    #[error("cached result '{name}' already exists (pass override to replace it)")]
    AlreadyExists { name: String },

    /// A required container attribute (`dt`, `dx`, ...) is missing or not
    /// numeric.
    #[error("container attribute '{key}' is missing or not a number")]
    MissingAttribute { key: String },

    /// The source dataset does not have the `(t, z, y, x, comp)` layout.
    #[error("dataset '{name}' has rank {got}, expected a (t, z, y, x, comp) field")]
    DatasetRank { name: String, got: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lazy(#[from] LazyError),
}
