//! Global thresholding via Otsu's method.
//!
//! The threshold maximizes between-class variance over a 256-bin
//! histogram of the plane's intensity range. A constant plane has no
//! separable classes; [`otsu_threshold`] reports that as `None` and the
//! preprocessor recovers by treating the whole plane as background.

use ndarray::{Array2, ArrayView2};

const BINS: usize = 256;

/// Computes the Otsu threshold of a plane.
///
/// Returns `None` for an empty or constant plane.
#[must_use]
pub fn otsu_threshold(plane: &ArrayView2<f32>) -> Option<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in plane.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if !(max > min) {
        return None;
    }

    let scale = (BINS - 1) as f32 / (max - min);
    let mut histogram = [0u64; BINS];
    for &v in plane.iter() {
        let bin = ((v - min) * scale).round() as usize;
        histogram[bin.min(BINS - 1)] += 1;
    }

    let total = plane.len() as f64;
    let mut sum = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum += i as f64 * count as f64;
    }

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut max_variance = 0.0;
    let mut best_bin = 0usize;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }
        sum_b += i as f64 * count as f64;
        let mean_b = sum_b / weight_b;
        let mean_f = (sum - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);
        if variance > max_variance {
            max_variance = variance;
            best_bin = i;
        }
    }

    Some(min + best_bin as f32 / scale)
}

/// Binarizes a plane against a cutoff: foreground iff intensity > cutoff.
#[must_use]
pub fn binarize(plane: &ArrayView2<f32>, cutoff: f32) -> Array2<bool> {
    plane.mapv(|v| v > cutoff)
}

/// Otsu threshold and binarize in one step.
///
/// A degenerate (constant) plane yields an all-background plane rather
/// than an error, so one flat slice cannot abort the rest of the stack.
#[must_use]
pub fn threshold_plane(plane: &ArrayView2<f32>) -> Array2<bool> {
    match otsu_threshold(plane) {
        Some(cutoff) => binarize(plane, cutoff),
        None => Array2::from_elem(plane.dim(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn bimodal_plane() -> Array2<f32> {
        Array2::from_shape_fn((16, 16), |(y, _)| if y < 8 { 10.0 } else { 200.0 })
    }

    #[test]
    fn test_otsu_separates_bimodal() {
        let plane = bimodal_plane();
        let cutoff = otsu_threshold(&plane.view()).unwrap();
        assert!((10.0..200.0).contains(&cutoff));
        let binary = binarize(&plane.view(), cutoff);
        assert_eq!(binary.iter().filter(|&&v| v).count(), 8 * 16);
    }

    #[test]
    fn test_constant_plane_degenerates() {
        let plane = Array2::from_elem((8, 8), 42.0f32);
        assert!(otsu_threshold(&plane.view()).is_none());
        let binary = threshold_plane(&plane.view());
        assert!(binary.iter().all(|&v| !v));
    }

    #[test]
    fn test_empty_plane_degenerates() {
        let plane = Array2::<f32>::zeros((0, 0));
        assert!(otsu_threshold(&plane.view()).is_none());
    }

    #[test]
    fn test_binarize_idempotent() {
        // Re-thresholding an already-binary plane reproduces it.
        let plane = bimodal_plane();
        let first = threshold_plane(&plane.view());
        let as_values = first.mapv(|v| if v { 1.0f32 } else { 0.0 });
        let second = threshold_plane(&as_values.view());
        assert_eq!(first, second);
    }
}
