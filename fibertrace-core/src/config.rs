//! Pipeline configuration.
//!
//! All pipeline inputs are explicit: the entry point takes a
//! [`PipelineConfig`] rather than reading process-wide defaults. The
//! configuration can be loaded from a JSON file and overridden field by
//! field via the builder setters.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Skeletonization strategy.
///
/// `Volume3d` thins the full 3D volume, preserving topological
/// connections between slices. `PerSlice` thins each z plane
/// independently and restacks; it is faster but fibers spanning several
/// slices fall apart into per-slice segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkeletonMode {
    /// Skeletonize the full 3D volume.
    Volume3d,
    /// Skeletonize each z slice independently, then stack.
    PerSlice,
}

impl Default for SkeletonMode {
    fn default() -> Self {
        Self::Volume3d
    }
}

/// Configuration for the fiber extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gaussian smoothing standard deviation in pixels (must be > 0).
    pub sigma: f64,
    /// Foreground components smaller than this many pixels are removed.
    pub min_object_size: usize,
    /// Background holes smaller than this many pixels are filled.
    pub min_hole_area: usize,
    /// Which series of the container to process.
    pub series_index: usize,
    /// Skeletonization strategy.
    pub skeleton_mode: SkeletonMode,
    /// Compute per-slice Canny edge maps as a diagnostic. The edge maps
    /// are informational only and never consumed by the pipeline.
    pub compute_edges: bool,
    /// Preprocess planes in parallel. Assembly order is by z index
    /// regardless.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            min_object_size: 64,
            min_hole_area: 64,
            series_index: 0,
            skeleton_mode: SkeletonMode::default(),
            compute_edges: false,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Gaussian smoothing standard deviation.
    #[must_use]
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the minimum surviving object size in pixels.
    #[must_use]
    pub fn with_min_object_size(mut self, size: usize) -> Self {
        self.min_object_size = size;
        self
    }

    /// Sets the maximum hole area to fill in pixels.
    #[must_use]
    pub fn with_min_hole_area(mut self, area: usize) -> Self {
        self.min_hole_area = area;
        self
    }

    /// Sets the series index to process.
    #[must_use]
    pub fn with_series_index(mut self, index: usize) -> Self {
        self.series_index = index;
        self
    }

    /// Sets the skeletonization strategy.
    #[must_use]
    pub fn with_skeleton_mode(mut self, mode: SkeletonMode) -> Self {
        self.skeleton_mode = mode;
        self
    }

    /// Enables or disables the diagnostic edge maps.
    #[must_use]
    pub fn with_compute_edges(mut self, enabled: bool) -> Self {
        self.compute_edges = enabled;
        self
    }

    /// Enables or disables parallel plane preprocessing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a field is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(Error::Config(format!(
                "sigma must be a positive finite number, got {}",
                self.sigma
            )));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON string and validates it.
    ///
    /// # Errors
    /// Returns [`Error::Config`] on parse or validation failure.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    /// Returns [`Error::Config`] on read, parse, or validation failure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }
}
