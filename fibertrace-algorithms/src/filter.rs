//! Gaussian smoothing.
//!
//! Separable convolution with a normalized Gaussian kernel and reflected
//! boundary handling. Because the kernel is normalized, a constant plane
//! passes through unchanged for any sigma.

use ndarray::{Array2, ArrayView2};

/// Builds a normalized 1D Gaussian kernel for the given sigma.
///
/// The kernel radius is `ceil(3 * sigma)`, clamped to at least 1.
#[must_use]
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let d = i as f64 - radius as f64;
            (-d * d / denom).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Mirrors an index into `[0, len)` without repeating the edge sample.
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = i.rem_euclid(period);
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

/// Smooths a plane with a separable Gaussian of the given sigma.
///
/// Sigma must be positive; callers validate it via
/// [`fibertrace_core::PipelineConfig::validate`].
#[must_use]
pub fn gaussian_blur(plane: &ArrayView2<f32>, sigma: f64) -> Array2<f32> {
    let (height, width) = plane.dim();
    if height == 0 || width == 0 {
        return plane.to_owned();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    // Horizontal pass.
    let mut horizontal = Array2::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f64;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = reflect_index(x as isize + k as isize - radius as isize, width);
                acc += w * f64::from(plane[[y, sx]]);
            }
            horizontal[[y, x]] = acc as f32;
        }
    }

    // Vertical pass.
    let mut smoothed = Array2::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f64;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = reflect_index(y as isize + k as isize - radius as isize, height);
                acc += w * f64::from(horizontal[[sy, x]]);
            }
            smoothed[[y, x]] = acc as f32;
        }
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_kernel_normalized() {
        for sigma in [0.5, 1.0, 2.0, 3.5] {
            let kernel = gaussian_kernel(sigma);
            let sum: f64 = kernel.iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
            assert_eq!(kernel.len() % 2, 1);
        }
    }

    #[test]
    fn test_constant_plane_unchanged() {
        for sigma in [0.5, 1.0, 2.0] {
            let plane = Array2::from_elem((8, 11), 37.5f32);
            let smoothed = gaussian_blur(&plane.view(), sigma);
            for &v in smoothed.iter() {
                assert_abs_diff_eq!(v, 37.5, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_smoothing_spreads_impulse() {
        let mut plane = Array2::zeros((9, 9));
        plane[[4, 4]] = 100.0;
        let smoothed = gaussian_blur(&plane.view(), 1.0);
        assert!(smoothed[[4, 4]] < 100.0);
        assert!(smoothed[[4, 5]] > 0.0);
        assert!(smoothed[[5, 5]] > 0.0);
        // Mass is conserved by the normalized kernel.
        let total: f32 = smoothed.iter().sum();
        assert_abs_diff_eq!(total, 100.0, epsilon = 1e-2);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 5), 1);
        assert_eq!(reflect_index(-2, 5), 2);
        assert_eq!(reflect_index(5, 5), 3);
        assert_eq!(reflect_index(6, 5), 2);
        assert_eq!(reflect_index(2, 5), 2);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_empty_plane() {
        let plane = Array2::<f32>::zeros((0, 0));
        let smoothed = gaussian_blur(&plane.view(), 1.0);
        assert_eq!(smoothed.dim(), (0, 0));
    }
}
