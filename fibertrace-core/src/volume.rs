//! Plane and volume types and assembly.
//!
//! Intensity planes are decoded from the container's native bit depth to
//! `f32`; binary planes mark candidate fiber material. Volumes stack
//! planes along a leading z axis, so the shape convention throughout is
//! (z, y, x).

use ndarray::{Array2, Array3, ArrayView3, Axis};

use crate::{Error, Result};

/// One (y, x) intensity slice.
pub type IntensityPlane = Array2<f32>;

/// One (y, x) binary slice, `true` = foreground.
pub type BinaryPlane = Array2<bool>;

/// A (z, y, x) binary volume.
pub type BinaryVolume = Array3<bool>;

/// A (z, y, x) intensity volume.
pub type IntensityVolume = Array3<f32>;

/// Stacks per-plane arrays along a new leading z axis, in the given
/// (ascending z) order.
///
/// An empty plane list yields an empty (0, 0, 0) volume.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if any plane disagrees with the
/// first plane's (y, x) dimensions.
pub fn assemble_volume<T: Clone + Default>(planes: &[Array2<T>]) -> Result<Array3<T>> {
    let Some(first) = planes.first() else {
        return Ok(Array3::default((0, 0, 0)));
    };
    let expected = first.dim();
    let mut volume = Array3::default((planes.len(), expected.0, expected.1));
    for (z, plane) in planes.iter().enumerate() {
        if plane.dim() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: plane.dim(),
                z,
            });
        }
        volume.index_axis_mut(Axis(0), z).assign(plane);
    }
    Ok(volume)
}

/// Counts foreground voxels in a binary volume.
#[must_use]
pub fn foreground_count(volume: &ArrayView3<bool>) -> usize {
    volume.iter().filter(|&&v| v).count()
}
