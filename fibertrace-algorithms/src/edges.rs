//! Canny edge detection.
//!
//! Diagnostic only: the pipeline never consumes the edge maps. Callers
//! opt in via the configuration and receive per-slice edge maps for
//! inspection.
//!
//! Stages: Gaussian smoothing, Sobel gradients, non-maximum suppression
//! along the quantized gradient direction, then double threshold with
//! hysteresis. Thresholds are fractions of the maximum gradient
//! magnitude.

use ndarray::{Array2, ArrayView2};

use crate::filter;

/// Default low hysteresis threshold as a fraction of the peak gradient.
pub const DEFAULT_LOW: f32 = 0.1;
/// Default high hysteresis threshold as a fraction of the peak gradient.
pub const DEFAULT_HIGH: f32 = 0.2;

/// Computes a Canny edge map of the plane.
///
/// `low` and `high` are hysteresis thresholds relative to the maximum
/// gradient magnitude, `0 <= low <= high <= 1`.
#[must_use]
pub fn canny(plane: &ArrayView2<f32>, sigma: f64, low: f32, high: f32) -> Array2<bool> {
    let (height, width) = plane.dim();
    if height < 3 || width < 3 {
        return Array2::from_elem((height, width), false);
    }

    let smoothed = filter::gaussian_blur(plane, sigma);

    // Sobel gradients; the one-pixel border keeps zero gradient.
    let mut gx = Array2::<f32>::zeros((height, width));
    let mut gy = Array2::<f32>::zeros((height, width));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let s = |dy: usize, dx: usize| smoothed[[y + dy - 1, x + dx - 1]];
            gx[[y, x]] = (s(0, 2) + 2.0 * s(1, 2) + s(2, 2)) - (s(0, 0) + 2.0 * s(1, 0) + s(2, 0));
            gy[[y, x]] = (s(2, 0) + 2.0 * s(2, 1) + s(2, 2)) - (s(0, 0) + 2.0 * s(0, 1) + s(0, 2));
        }
    }

    let magnitude = Array2::from_shape_fn((height, width), |(y, x)| {
        gx[[y, x]].hypot(gy[[y, x]])
    });
    let peak = magnitude.iter().fold(0.0f32, |a, &b| a.max(b));
    if peak == 0.0 {
        return Array2::from_elem((height, width), false);
    }

    // Non-maximum suppression along the quantized gradient direction.
    let mut thin = Array2::<f32>::zeros((height, width));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let m = magnitude[[y, x]];
            if m == 0.0 {
                continue;
            }
            let angle = gy[[y, x]].atan2(gx[[y, x]]).to_degrees();
            let angle = if angle < 0.0 { angle + 180.0 } else { angle };
            let (a, b) = if !(22.5..157.5).contains(&angle) {
                (magnitude[[y, x - 1]], magnitude[[y, x + 1]])
            } else if angle < 67.5 {
                (magnitude[[y - 1, x - 1]], magnitude[[y + 1, x + 1]])
            } else if angle < 112.5 {
                (magnitude[[y - 1, x]], magnitude[[y + 1, x]])
            } else {
                (magnitude[[y - 1, x + 1]], magnitude[[y + 1, x - 1]])
            };
            if m >= a && m >= b {
                thin[[y, x]] = m;
            }
        }
    }

    // Double threshold with hysteresis: strong seeds grow into weak.
    let low = low * peak;
    let high = high * peak;
    let mut edges = Array2::from_elem((height, width), false);
    let mut stack = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if thin[[y, x]] >= high && !edges[[y, x]] {
                edges[[y, x]] = true;
                stack.push((y, x));
                while let Some((cy, cx)) = stack.pop() {
                    for dy in -1..=1isize {
                        for dx in -1..=1isize {
                            let (ny, nx) = (cy as isize + dy, cx as isize + dx);
                            if ny < 0 || nx < 0 || ny >= height as isize || nx >= width as isize {
                                continue;
                            }
                            let (ny, nx) = (ny as usize, nx as usize);
                            if !edges[[ny, nx]] && thin[[ny, nx]] >= low {
                                edges[[ny, nx]] = true;
                                stack.push((ny, nx));
                            }
                        }
                    }
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_step_edge_detected() {
        let plane = Array2::from_shape_fn((16, 16), |(_, x)| if x < 8 { 0.0 } else { 200.0 });
        let edges = canny(&plane.view(), 1.0, DEFAULT_LOW, DEFAULT_HIGH);
        assert!(edges.iter().any(|&v| v));
        // Edge responses concentrate around the step column.
        for y in 2..14 {
            let row_has_edge = (5..11).any(|x| edges[[y, x]]);
            assert!(row_has_edge, "no edge response in row {y}");
        }
    }

    #[test]
    fn test_constant_plane_has_no_edges() {
        let plane = Array2::from_elem((12, 12), 80.0f32);
        let edges = canny(&plane.view(), 1.0, DEFAULT_LOW, DEFAULT_HIGH);
        assert!(edges.iter().all(|&v| !v));
    }

    #[test]
    fn test_tiny_plane_is_empty() {
        let plane = Array2::from_elem((2, 2), 1.0f32);
        let edges = canny(&plane.view(), 1.0, DEFAULT_LOW, DEFAULT_HIGH);
        assert!(edges.iter().all(|&v| !v));
    }
}
