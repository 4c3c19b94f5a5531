//! Parsing and ingestion errors.

use std::path::PathBuf;

use thiserror::Error;

use magnon_store::StoreError;

/// Errors raised while parsing OVF files or ingesting them.
#[derive(Debug, Error)]
pub enum OvfError {
    #[error("ovf file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("malformed ovf header in {path}: {reason}")]
    MalformedHeader { path: PathBuf, reason: String },

    #[error("ovf header of {path} is missing '{field}'")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("bad ovf control number in {path}: got {got}")]
    BadControlNumber { path: PathBuf, got: f32 },

    #[error("ovf data block of {path} is truncated")]
    TruncatedData { path: PathBuf },

    #[error("frame {path} has shape {got:?}, expected {expected:?}")]
    FrameShapeMismatch {
        path: PathBuf,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("no input frames given")]
    NoFrames,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
