//! fibertrace-algorithms: Image preprocessing and skeleton analysis.
//!
//! This crate implements the pipeline's algorithmic stages:
//! - **Filtering** - separable Gaussian smoothing
//! - **Thresholding** - Otsu global threshold with degenerate fallback
//! - **Morphology** - connected-component cleanup of speckle and holes
//! - **Skeletonization** - 2D Zhang-Suen and 3D border-peeling thinning
//! - **Graph analysis** - skeleton branches, endpoints, and statistics
//! - **Edges** - diagnostic Canny maps (never consumed downstream)
//!
#![warn(missing_docs)]

pub mod edges;
pub mod filter;
pub mod graph;
pub mod morphology;
pub mod processing;
pub mod skeleton;
pub mod threshold;

pub use graph::{Branch, SkeletonGraph};
pub use processing::{
    edge_maps, preprocess_plane, preprocess_stack, trace_binary_volume, trace_fibers,
};
pub use skeleton::{skeletonize, skeletonize_plane};

// Re-export core configuration types for convenience
pub use fibertrace_core::{PipelineConfig, SkeletonMode};
