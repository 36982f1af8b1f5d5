//! fibertrace-lif: LIF microscopy container parsing.
//!
//! This crate reads the structure of Leica LIF-style containers: the
//! length-prefixed binary blocks, the UTF-16 metadata XML, and the
//! per-series pixel payload directory. It operates on byte slices only;
//! file access and pixel decoding live in `fibertrace-io`.
//!
//! The format support is a documented subset sufficient for the fiber
//! extraction pipeline: versions 1 and 2, 8/16-bit samples, and the
//! dimension/channel attributes needed to address (z, t, c) planes.
//!
//! # Key components
//!
//! - [`parse_container`] - block structure walk, payload directory
//! - [`parse_metadata`] - series dimensions, channels, bit depth
//! - [`SeriesInfo`] - plane addressing within a memory block

pub mod block;
mod error;
pub mod metadata;

pub use block::{parse_container, ContainerLayout, MemoryBlock, BLOCK_MAGIC, TEST_MARK};
pub use error::{Error, Result};
pub use metadata::{format_version, parse_metadata, LifMetadata, SeriesInfo};
