//! fibertrace-core: Core types for microscopy fiber extraction.
//!
//! This crate provides the foundational types shared across the
//! fibertrace pipeline: plane/volume aliases and assembly, flat-index
//! coordinate resolution, fiber records, and pipeline configuration.
//!

pub mod config;
pub mod coords;
pub mod error;
pub mod fiber;
pub mod volume;

pub use config::{PipelineConfig, SkeletonMode};
pub use coords::{flatten, resolve, voxel_count};
pub use error::{Error, Result};
pub use fiber::{FiberRecord, TraceSummary, Voxel};
pub use volume::{
    assemble_volume, foreground_count, BinaryPlane, BinaryVolume, IntensityPlane, IntensityVolume,
};
