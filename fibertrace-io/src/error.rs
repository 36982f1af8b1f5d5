//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container format or metadata error.
    #[error("container error: {0}")]
    Lif(#[from] fibertrace_lif::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] fibertrace_core::Error),

    /// Result serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Series index outside the container's series list.
    #[error("series index {index} out of range: container has {count} series")]
    SeriesIndex { index: usize, count: usize },

    /// Plane coordinate outside the series' dimensions.
    #[error("plane index out of range: {axis}={index}, series has {count}")]
    PlaneIndex {
        axis: &'static str,
        index: usize,
        count: usize,
    },
}
