//! Topology-preserving skeletonization.
//!
//! Two strategies, selected by [`SkeletonMode`]:
//!
//! - [`SkeletonMode::Volume3d`] thins the full volume by iterative
//!   border peeling. A voxel is removed only when it is a simple point
//!   (removal keeps exactly one 26-connected foreground component in
//!   its neighborhood and exactly one 6-connected background component
//!   among its face-adjacent background) and is not a curve endpoint.
//!   Inter-slice connections survive.
//! - [`SkeletonMode::PerSlice`] applies Zhang-Suen thinning to each z
//!   plane independently and restacks. Faster, but a fiber crossing
//!   slices decomposes into per-slice segments.
//!
//! Both preserve the connected-component count of the input. Neither
//! promises a unique minimal skeleton; the result depends on peel
//! order, which is fixed and deterministic here.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

pub use fibertrace_core::SkeletonMode;

/// Skeletonizes a binary volume with the chosen strategy.
#[must_use]
pub fn skeletonize(volume: &ArrayView3<bool>, mode: SkeletonMode) -> Array3<bool> {
    match mode {
        SkeletonMode::Volume3d => skeletonize_3d(volume),
        SkeletonMode::PerSlice => {
            let mut out = volume.to_owned();
            for mut slice in out.axis_iter_mut(Axis(0)) {
                let thinned = skeletonize_plane(&slice.view());
                slice.assign(&thinned);
            }
            out
        }
    }
}

/// Zhang-Suen thinning of one binary plane.
#[must_use]
pub fn skeletonize_plane(plane: &ArrayView2<bool>) -> Array2<bool> {
    let (height, width) = plane.dim();
    let mut skeleton = plane.to_owned();
    let mut deletions: Vec<(usize, usize)> = Vec::new();

    let at = |s: &Array2<bool>, y: isize, x: isize| -> bool {
        if y < 0 || x < 0 || y >= height as isize || x >= width as isize {
            false
        } else {
            s[[y as usize, x as usize]]
        }
    };

    loop {
        let mut changed = false;
        for pass in 0..2 {
            deletions.clear();
            for y in 0..height {
                for x in 0..width {
                    if !skeleton[[y, x]] {
                        continue;
                    }
                    let (yi, xi) = (y as isize, x as isize);
                    // P2..P9 clockwise from north.
                    let p = [
                        at(&skeleton, yi - 1, xi),
                        at(&skeleton, yi - 1, xi + 1),
                        at(&skeleton, yi, xi + 1),
                        at(&skeleton, yi + 1, xi + 1),
                        at(&skeleton, yi + 1, xi),
                        at(&skeleton, yi + 1, xi - 1),
                        at(&skeleton, yi, xi - 1),
                        at(&skeleton, yi - 1, xi - 1),
                    ];
                    let neighbors = p.iter().filter(|&&v| v).count();
                    if !(2..=6).contains(&neighbors) {
                        continue;
                    }
                    let transitions = (0..8)
                        .filter(|&i| !p[i] && p[(i + 1) % 8])
                        .count();
                    if transitions != 1 {
                        continue;
                    }
                    let (p2, p4, p6, p8) = (p[0], p[2], p[4], p[6]);
                    let ok = if pass == 0 {
                        !(p2 && p4 && p6) && !(p4 && p6 && p8)
                    } else {
                        !(p2 && p4 && p8) && !(p2 && p6 && p8)
                    };
                    if ok {
                        deletions.push((y, x));
                    }
                }
            }
            for &(y, x) in &deletions {
                skeleton[[y, x]] = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    skeleton
}

/// Offsets of the six face directions.
const FACES: [(isize, isize, isize); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// 3D thinning by border peeling with simple-point preservation.
fn skeletonize_3d(volume: &ArrayView3<bool>) -> Array3<bool> {
    let mut skeleton = volume.to_owned();
    let (nz, ny, nx) = skeleton.dim();
    let mut candidates: Vec<(usize, usize, usize)> = Vec::new();

    loop {
        let mut changed = false;
        for face in FACES {
            candidates.clear();
            for z in 0..nz {
                for y in 0..ny {
                    for x in 0..nx {
                        if !skeleton[[z, y, x]] {
                            continue;
                        }
                        if voxel_at(&skeleton.view(), z as isize + face.0, y as isize + face.1, x as isize + face.2) {
                            continue; // not a border voxel for this direction
                        }
                        let local = neighborhood(&skeleton.view(), z, y, x);
                        if neighbor_count(&local) <= 1 {
                            continue; // curve endpoint
                        }
                        if is_simple_point(&local) {
                            candidates.push((z, y, x));
                        }
                    }
                }
            }
            // Sequential re-check: earlier deletions in this subiteration
            // may have made a candidate non-simple.
            for &(z, y, x) in &candidates {
                let local = neighborhood(&skeleton.view(), z, y, x);
                if neighbor_count(&local) > 1 && is_simple_point(&local) {
                    skeleton[[z, y, x]] = false;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    skeleton
}

fn voxel_at(volume: &ArrayView3<bool>, z: isize, y: isize, x: isize) -> bool {
    let (nz, ny, nx) = volume.dim();
    if z < 0 || y < 0 || x < 0 || z >= nz as isize || y >= ny as isize || x >= nx as isize {
        false
    } else {
        volume[[z as usize, y as usize, x as usize]]
    }
}

/// 3x3x3 occupancy around a voxel; out-of-bounds reads as background.
/// Index = (dz+1)*9 + (dy+1)*3 + (dx+1); the center is index 13.
fn neighborhood(volume: &ArrayView3<bool>, z: usize, y: usize, x: usize) -> [bool; 27] {
    let mut local = [false; 27];
    for dz in -1..=1isize {
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let idx = ((dz + 1) * 9 + (dy + 1) * 3 + (dx + 1)) as usize;
                local[idx] = voxel_at(
                    volume,
                    z as isize + dz,
                    y as isize + dy,
                    x as isize + dx,
                );
            }
        }
    }
    local
}

const CENTER: usize = 13;

fn offset_of(idx: usize) -> (isize, isize, isize) {
    (
        idx as isize / 9 - 1,
        (idx as isize / 3) % 3 - 1,
        idx as isize % 3 - 1,
    )
}

fn neighbor_count(local: &[bool; 27]) -> usize {
    local
        .iter()
        .enumerate()
        .filter(|&(i, &v)| i != CENTER && v)
        .count()
}

/// Tests whether removing the center voxel preserves local topology.
///
/// Characterization for (26, 6) connectivity: the foreground of the
/// 26-neighborhood must form exactly one 26-connected component, and
/// the background within the 18-neighborhood must form exactly one
/// 6-connected component that touches a face neighbor.
fn is_simple_point(local: &[bool; 27]) -> bool {
    foreground_components_26(local) == 1 && background_components_6(local) == 1
}

/// Counts 26-connected foreground components among the 26 neighbors.
fn foreground_components_26(local: &[bool; 27]) -> usize {
    let mut seen = [false; 27];
    let mut components = 0;
    for start in 0..27 {
        if start == CENTER || !local[start] || seen[start] {
            continue;
        }
        components += 1;
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(a) = stack.pop() {
            let (az, ay, ax) = offset_of(a);
            for b in 0..27 {
                if b == CENTER || seen[b] || !local[b] {
                    continue;
                }
                let (bz, by, bx) = offset_of(b);
                if (az - bz).abs() <= 1 && (ay - by).abs() <= 1 && (ax - bx).abs() <= 1 {
                    seen[b] = true;
                    stack.push(b);
                }
            }
        }
    }
    components
}

/// Counts 6-connected background components within the 18-neighborhood
/// that are face-adjacent to the center.
fn background_components_6(local: &[bool; 27]) -> usize {
    let in_18 = |idx: usize| -> bool {
        let (dz, dy, dx) = offset_of(idx);
        (1..=2).contains(&(dz.abs() + dy.abs() + dx.abs()))
    };
    let mut seen = [false; 27];
    let mut components = 0;
    for start in 0..27 {
        if !in_18(start) || local[start] || seen[start] {
            continue;
        }
        let (dz, dy, dx) = offset_of(start);
        if dz.abs() + dy.abs() + dx.abs() != 1 {
            continue; // grow components only from face neighbors
        }
        components += 1;
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(a) = stack.pop() {
            let (az, ay, ax) = offset_of(a);
            for b in 0..27 {
                if !in_18(b) || seen[b] || local[b] {
                    continue;
                }
                let (bz, by, bx) = offset_of(b);
                if (az - bz).abs() + (ay - by).abs() + (ax - bx).abs() == 1 {
                    seen[b] = true;
                    stack.push(b);
                }
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::label_volume;
    use ndarray::{Array2, Array3};

    fn line_volume() -> Array3<bool> {
        let mut volume = Array3::from_elem((3, 10, 10), false);
        for x in 0..10 {
            volume[[1, 0, x]] = true;
        }
        volume
    }

    #[test]
    fn test_line_is_its_own_skeleton_3d() {
        let volume = line_volume();
        let skeleton = skeletonize(&volume.view(), SkeletonMode::Volume3d);
        assert_eq!(skeleton, volume);
    }

    #[test]
    fn test_line_is_its_own_skeleton_per_slice() {
        let volume = line_volume();
        let skeleton = skeletonize(&volume.view(), SkeletonMode::PerSlice);
        assert_eq!(skeleton, volume);
    }

    #[test]
    fn test_plane_slab_thins() {
        let mut volume = Array3::from_elem((1, 12, 12), false);
        for y in 2..10 {
            for x in 2..10 {
                volume[[0, y, x]] = true;
            }
        }
        let before = volume.iter().filter(|&&v| v).count();
        let skeleton = skeletonize(&volume.view(), SkeletonMode::Volume3d);
        let after = skeleton.iter().filter(|&&v| v).count();
        assert!(after < before);
        assert!(after > 0);
        let (_, count) = label_volume(&skeleton.view());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_component_count_preserved() {
        let mut volume = Array3::from_elem((3, 16, 16), false);
        // Blob 1: solid bar in slice 0.
        for y in 2..5 {
            for x in 2..14 {
                volume[[0, y, x]] = true;
            }
        }
        // Blob 2: cube spanning slices 1-2.
        for z in 1..3 {
            for y in 8..14 {
                for x in 8..14 {
                    volume[[z, y, x]] = true;
                }
            }
        }
        let (_, before) = label_volume(&volume.view());
        for mode in [SkeletonMode::Volume3d, SkeletonMode::PerSlice] {
            let skeleton = skeletonize(&volume.view(), mode);
            let (_, after) = label_volume(&skeleton.view());
            // Per-slice thinning cannot merge or drop whole components
            // here because each blob is solid within every slice it
            // occupies.
            assert_eq!(after, before, "mode {mode:?}");
        }
    }

    #[test]
    fn test_empty_volume_unchanged() {
        let volume = Array3::from_elem((2, 4, 4), false);
        let skeleton = skeletonize(&volume.view(), SkeletonMode::Volume3d);
        assert_eq!(skeleton, volume);
    }

    #[test]
    fn test_zhang_suen_keeps_single_pixel_line() {
        let mut plane = Array2::from_elem((5, 9), false);
        for x in 1..8 {
            plane[[2, x]] = true;
        }
        let thinned = skeletonize_plane(&plane.view());
        assert_eq!(thinned, plane);
    }

    #[test]
    fn test_simple_point_rejects_bridge() {
        // Center connecting two otherwise separate voxels must stay.
        let mut volume = Array3::from_elem((1, 1, 3), false);
        volume[[0, 0, 0]] = true;
        volume[[0, 0, 1]] = true;
        volume[[0, 0, 2]] = true;
        let local = neighborhood(&volume.view(), 0, 0, 1);
        assert!(!is_simple_point(&local));
    }

    #[test]
    fn test_simple_point_accepts_surface_voxel() {
        // A voxel glued face-to-face onto a single neighbor is removable.
        let mut volume = Array3::from_elem((1, 2, 2), false);
        volume[[0, 0, 0]] = true;
        volume[[0, 0, 1]] = true;
        volume[[0, 1, 0]] = true;
        volume[[0, 1, 1]] = true;
        let local = neighborhood(&volume.view(), 0, 0, 0);
        assert!(is_simple_point(&local));
    }
}
