//! High-level pipeline composition.
//!
//! Combines the per-plane preprocessing, volume assembly,
//! skeletonization, and graph analysis into the single entry point
//! [`trace_fibers`]. Every stage consumes its input and produces a new
//! owned result; the pipeline holds no state across runs.

use ndarray::{Array2, ArrayView2, ArrayView3};
use rayon::prelude::*;

use fibertrace_core::{
    assemble_volume, coords, BinaryPlane, FiberRecord, IntensityPlane, PipelineConfig, Result,
    SkeletonMode, TraceSummary,
};

use crate::graph::SkeletonGraph;
use crate::{edges, filter, morphology, skeleton, threshold};

/// Preprocesses one intensity plane into a cleaned binary plane.
///
/// Fixed stage order: Gaussian smoothing, Otsu threshold and binarize
/// (a constant plane degenerates to all-background), small-object
/// removal, small-hole filling.
#[must_use]
pub fn preprocess_plane(plane: &ArrayView2<f32>, config: &PipelineConfig) -> BinaryPlane {
    let smoothed = filter::gaussian_blur(plane, config.sigma);
    let binary = threshold::threshold_plane(&smoothed.view());
    let binary = morphology::remove_small_objects(&binary.view(), config.min_object_size);
    morphology::remove_small_holes(&binary.view(), config.min_hole_area)
}

/// Preprocesses a whole stack, optionally fanning planes out across
/// threads. Output order is ascending z regardless of completion order.
#[must_use]
pub fn preprocess_stack(planes: &[IntensityPlane], config: &PipelineConfig) -> Vec<BinaryPlane> {
    if config.parallel {
        planes
            .par_iter()
            .map(|plane| preprocess_plane(&plane.view(), config))
            .collect()
    } else {
        planes
            .iter()
            .map(|plane| preprocess_plane(&plane.view(), config))
            .collect()
    }
}

/// Computes the diagnostic Canny edge map for every plane.
///
/// Informational only; nothing downstream consumes the maps.
#[must_use]
pub fn edge_maps(planes: &[IntensityPlane], config: &PipelineConfig) -> Vec<Array2<bool>> {
    planes
        .iter()
        .map(|plane| {
            edges::canny(
                &plane.view(),
                config.sigma,
                edges::DEFAULT_LOW,
                edges::DEFAULT_HIGH,
            )
        })
        .collect()
}

/// Runs skeletonization and graph analysis on an assembled binary
/// volume and resolves branch endpoints to (z, y, x) coordinates.
///
/// # Errors
/// Returns [`fibertrace_core::Error::CoordinateRange`] only on an
/// internal graph/shape inconsistency.
pub fn trace_binary_volume(
    volume: &ArrayView3<bool>,
    intensity: Option<&ArrayView3<f32>>,
    mode: SkeletonMode,
) -> Result<TraceSummary> {
    let thinned = skeleton::skeletonize(volume, mode);
    let graph = SkeletonGraph::build(&thinned.view());
    let shape = graph.shape();

    let mut fibers = Vec::new();
    for branch in graph.branches(intensity) {
        let start = coords::resolve(branch.endpoint_a, shape)?;
        let end = coords::resolve(branch.endpoint_b, shape)?;
        fibers.push(FiberRecord {
            start: start.into(),
            end: end.into(),
            length: branch.length,
            mean_intensity: branch.mean_intensity,
            component: branch.component,
        });
    }

    Ok(TraceSummary {
        fibers,
        component_count: graph.component_count(),
        skeleton_voxels: graph.node_count(),
    })
}

/// Full pipeline: preprocess every plane, assemble the volume,
/// skeletonize, and extract fiber records.
///
/// # Errors
/// Returns a configuration error for invalid parameters, a shape
/// mismatch if plane dimensions disagree, or a coordinate-range error
/// on an internal graph/shape inconsistency.
pub fn trace_fibers(planes: &[IntensityPlane], config: &PipelineConfig) -> Result<TraceSummary> {
    config.validate()?;
    let binary = preprocess_stack(planes, config);
    let volume = assemble_volume(&binary)?;
    let intensity = assemble_volume(planes)?;
    trace_binary_volume(
        &volume.view(),
        Some(&intensity.view()),
        config.skeleton_mode,
    )
}
