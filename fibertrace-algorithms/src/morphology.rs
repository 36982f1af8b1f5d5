//! Binary morphological cleanup.
//!
//! Connected-component labeling via union-find, used to suppress
//! speckle (small foreground components) and to close small holes
//! inside fiber bodies (small background components). Foreground uses
//! 8-connectivity; the background complement uses 4-connectivity.

use ndarray::{Array2, ArrayView2, ArrayView3};

/// Union-Find data structure for connected component detection.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    pub(crate) fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Pixel connectivity for 2D labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Edge neighbors only.
    Four,
    /// Edge and corner neighbors.
    Eight,
}

/// Backward scan offsets (dy, dx) for each connectivity.
const OFFSETS_FOUR: [(isize, isize); 2] = [(-1, 0), (0, -1)];
const OFFSETS_EIGHT: [(isize, isize); 4] = [(-1, -1), (-1, 0), (-1, 1), (0, -1)];

/// Labels connected components of `true` pixels.
///
/// Returns flat row-major labels (`0` = background, components numbered
/// from 1 in scan order) and the component count.
#[must_use]
pub fn label_plane(plane: &ArrayView2<bool>, connectivity: Connectivity) -> (Vec<u32>, usize) {
    let (height, width) = plane.dim();
    let len = height * width;
    let mut uf = UnionFind::new(len);
    let offsets: &[(isize, isize)] = match connectivity {
        Connectivity::Four => &OFFSETS_FOUR,
        Connectivity::Eight => &OFFSETS_EIGHT,
    };

    for y in 0..height {
        for x in 0..width {
            if !plane[[y, x]] {
                continue;
            }
            let flat = y * width + x;
            for &(dy, dx) in offsets {
                let ny = y as isize + dy;
                let nx = x as isize + dx;
                if ny < 0 || nx < 0 || nx >= width as isize {
                    continue;
                }
                let (ny, nx) = (ny as usize, nx as usize);
                if plane[[ny, nx]] {
                    uf.union(flat, ny * width + nx);
                }
            }
        }
    }

    resolve_labels(&mut uf, len, |flat| plane[[flat / width, flat % width]])
}

/// Labels connected components of `true` voxels with 26-connectivity.
///
/// Returns flat row-major labels and the component count.
#[must_use]
pub fn label_volume(volume: &ArrayView3<bool>) -> (Vec<u32>, usize) {
    let (nz, ny, nx) = volume.dim();
    let len = nz * ny * nx;
    let mut uf = UnionFind::new(len);

    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                if !volume[[z, y, x]] {
                    continue;
                }
                let flat = (z * ny + y) * nx + x;
                // Backward half of the 26-neighborhood keeps each pair
                // visited once.
                for dz in -1..=0isize {
                    for dy in -1..=1isize {
                        for dx in -1..=1isize {
                            if (dz, dy, dx) >= (0, 0, 0) {
                                continue;
                            }
                            let (pz, py, px) =
                                (z as isize + dz, y as isize + dy, x as isize + dx);
                            if pz < 0 || py < 0 || px < 0 || py >= ny as isize || px >= nx as isize
                            {
                                continue;
                            }
                            let (pz, py, px) = (pz as usize, py as usize, px as usize);
                            if volume[[pz, py, px]] {
                                uf.union(flat, (pz * ny + py) * nx + px);
                            }
                        }
                    }
                }
            }
        }
    }

    resolve_labels(&mut uf, len, |flat| {
        let z = flat / (ny * nx);
        let rest = flat % (ny * nx);
        volume[[z, rest / nx, rest % nx]]
    })
}

/// Collapses union-find roots into compact labels in scan order.
fn resolve_labels<F: Fn(usize) -> bool>(
    uf: &mut UnionFind,
    len: usize,
    is_foreground: F,
) -> (Vec<u32>, usize) {
    let mut labels = vec![0u32; len];
    let mut root_label = std::collections::HashMap::new();
    let mut next = 0u32;
    for flat in 0..len {
        if !is_foreground(flat) {
            continue;
        }
        let root = uf.find(flat);
        let label = *root_label.entry(root).or_insert_with(|| {
            next += 1;
            next
        });
        labels[flat] = label;
    }
    (labels, next as usize)
}

/// Removes foreground components smaller than `min_size` pixels
/// (8-connectivity).
#[must_use]
pub fn remove_small_objects(plane: &ArrayView2<bool>, min_size: usize) -> Array2<bool> {
    if min_size <= 1 {
        return plane.to_owned();
    }
    let (labels, count) = label_plane(plane, Connectivity::Eight);
    let mut sizes = vec![0usize; count + 1];
    for &label in &labels {
        sizes[label as usize] += 1;
    }
    let (_, width) = plane.dim();
    Array2::from_shape_fn(plane.dim(), |(y, x)| {
        let label = labels[y * width + x];
        label != 0 && sizes[label as usize] >= min_size
    })
}

/// Fills background holes smaller than `min_area` pixels
/// (4-connectivity on the complement).
#[must_use]
pub fn remove_small_holes(plane: &ArrayView2<bool>, min_area: usize) -> Array2<bool> {
    if min_area <= 1 {
        return plane.to_owned();
    }
    let complement = plane.mapv(|v| !v);
    let (labels, count) = label_plane(&complement.view(), Connectivity::Four);
    let mut sizes = vec![0usize; count + 1];
    for &label in &labels {
        sizes[label as usize] += 1;
    }
    let (_, width) = plane.dim();
    Array2::from_shape_fn(plane.dim(), |(y, x)| {
        let label = labels[y * width + x];
        label == 0 || sizes[label as usize] < min_area
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn plane_from(rows: &[&[u8]]) -> Array2<bool> {
        let height = rows.len();
        let width = rows[0].len();
        Array2::from_shape_fn((height, width), |(y, x)| rows[y][x] != 0)
    }

    #[test]
    fn test_label_plane_two_components() {
        let plane = plane_from(&[
            &[1, 1, 0, 0],
            &[0, 1, 0, 0],
            &[0, 0, 0, 1],
            &[0, 0, 0, 1],
        ]);
        let (_, count) = label_plane(&plane.view(), Connectivity::Eight);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_label_diagonal_connectivity() {
        let plane = plane_from(&[&[1, 0], &[0, 1]]);
        let (_, eight) = label_plane(&plane.view(), Connectivity::Eight);
        let (_, four) = label_plane(&plane.view(), Connectivity::Four);
        assert_eq!(eight, 1);
        assert_eq!(four, 2);
    }

    #[test]
    fn test_label_volume_across_slices() {
        let mut volume = Array3::from_elem((2, 2, 2), false);
        volume[[0, 0, 0]] = true;
        volume[[1, 1, 1]] = true; // diagonal neighbor in 26-connectivity
        let (_, count) = label_volume(&volume.view());
        assert_eq!(count, 1);

        let mut split = Array3::from_elem((3, 1, 1), false);
        split[[0, 0, 0]] = true;
        split[[2, 0, 0]] = true;
        let (_, count) = label_volume(&split.view());
        assert_eq!(count, 2);
    }

    #[test]
    fn test_remove_small_objects() {
        let plane = plane_from(&[
            &[1, 0, 0, 0, 0],
            &[0, 0, 1, 1, 1],
            &[0, 0, 1, 1, 1],
            &[0, 0, 0, 0, 0],
        ]);
        let cleaned = remove_small_objects(&plane.view(), 4);
        assert!(!cleaned[[0, 0]]);
        assert!(cleaned[[1, 2]]);
        assert_eq!(cleaned.iter().filter(|&&v| v).count(), 6);
    }

    #[test]
    fn test_remove_small_holes() {
        let plane = plane_from(&[
            &[1, 1, 1, 1],
            &[1, 0, 0, 1],
            &[1, 0, 0, 1],
            &[1, 1, 1, 1],
        ]);
        let filled = remove_small_holes(&plane.view(), 5);
        assert!(filled.iter().all(|&v| v));
    }

    #[test]
    fn test_large_hole_kept() {
        let mut plane = Array2::from_elem((8, 8), true);
        for y in 2..6 {
            for x in 2..6 {
                plane[[y, x]] = false;
            }
        }
        let filled = remove_small_holes(&plane.view(), 5);
        assert!(!filled[[3, 3]]);
    }

    #[test]
    fn test_cleanup_never_grows_foreground_or_components() {
        let plane = plane_from(&[
            &[1, 1, 0, 0, 1],
            &[1, 0, 0, 0, 0],
            &[0, 0, 1, 1, 0],
            &[1, 0, 1, 1, 0],
        ]);
        let before_foreground = plane.iter().filter(|&&v| v).count();
        let (_, before_components) = label_plane(&plane.view(), Connectivity::Eight);

        let cleaned = remove_small_objects(&plane.view(), 3);
        let filled = remove_small_holes(&cleaned.view(), 2);

        // Hole filling may add pixels inside bodies but never beyond the
        // input's footprint union with its holes; component count never
        // grows.
        let (_, after_components) = label_plane(&filled.view(), Connectivity::Eight);
        assert!(after_components <= before_components);
        let after_objects = cleaned.iter().filter(|&&v| v).count();
        assert!(after_objects <= before_foreground);
    }
}
