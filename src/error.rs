//! Recoverable error conditions.
//!
//! Broken ordering preconditions inside the algorithms are programmer errors
//! and panic at the offending `set` call instead of showing up here.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SpmvError>;

#[derive(Debug, thiserror::Error)]
pub enum SpmvError {
    /// Placeholder for a routine that has no body yet. The benchmark harness
    /// reports it and moves on to the next measurement.
    #[error("not yet implemented")]
    NotImplemented,

    /// Returned by `SparseVector::try_set` when `index` does not strictly
    /// follow the last stored index.
    #[error("index {index} is not greater than the last stored index {last}")]
    OutOfOrder { index: usize, last: usize },

    /// The parallel product disagrees with the sequential one.
    #[error("{schedule} result differs from the sequential one at {mismatches} of {len} entries")]
    ResultMismatch {
        schedule: String,
        mismatches: usize,
        len: usize,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read matrix market file: {0}")]
    MatrixMarket(#[from] sprs::io::IoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
