//! Error types for fibertrace-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for fibertrace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Plane dimensions disagree during volume assembly.
    #[error("plane shape mismatch: expected {expected:?}, found {found:?} at z={z}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
        z: usize,
    },

    /// Flat index outside the volume's linear index space.
    ///
    /// Always indicates a graph/shape bookkeeping bug, never bad input.
    #[error("flat index {index} out of range for volume of {len} voxels")]
    CoordinateRange { index: usize, len: usize },

    /// Voxel coordinate outside the volume's shape.
    #[error("voxel ({z}, {y}, {x}) out of range for shape {shape:?}")]
    VoxelRange {
        z: usize,
        y: usize,
        x: usize,
        shape: (usize, usize, usize),
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
