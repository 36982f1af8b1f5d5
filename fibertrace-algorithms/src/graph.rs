//! Skeleton graph conversion and branch extraction.
//!
//! Skeleton voxels become graph nodes addressed by row-major flat
//! index; adjacency is 26-connectivity (8 within a plane). A branch is
//! a maximal path between two non-degree-2 nodes, so junction voxels
//! appear as endpoints of every branch meeting them. Closed loops with
//! no junction are traced from their smallest voxel, which serves as
//! both endpoints; isolated voxels yield zero-length branches.
//!
//! Branch order is deterministic for identical skeleton input: nodes
//! are scanned in ascending flat-index order and the result is sorted
//! by normalized endpoint pair.

use std::collections::{HashMap, HashSet};

use ndarray::ArrayView3;

use crate::morphology::UnionFind;

/// One maximal skeleton branch with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Smaller endpoint flat index.
    pub endpoint_a: usize,
    /// Larger endpoint flat index (equal to `endpoint_a` for loops and
    /// isolated voxels).
    pub endpoint_b: usize,
    /// Sum of Euclidean step distances along the branch.
    pub length: f64,
    /// Mean underlying intensity over branch voxels; 0 without an
    /// intensity volume.
    pub mean_intensity: f64,
    /// Number of distinct voxels on the branch.
    pub voxel_count: usize,
    /// Connected-component label of the branch (0-based).
    pub component: usize,
}

/// Sparse adjacency graph over skeleton voxels.
pub struct SkeletonGraph {
    shape: (usize, usize, usize),
    /// Sorted flat indices of skeleton voxels.
    voxels: Vec<usize>,
    /// Adjacent node ids per node, ascending.
    adjacency: Vec<Vec<usize>>,
}

impl SkeletonGraph {
    /// Builds the graph from a skeleton volume.
    #[must_use]
    pub fn build(skeleton: &ArrayView3<bool>) -> Self {
        let (nz, ny, nx) = skeleton.dim();
        let shape = (nz, ny, nx);

        let mut voxels = Vec::new();
        let mut node_of: HashMap<usize, usize> = HashMap::new();
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    if skeleton[[z, y, x]] {
                        let flat = (z * ny + y) * nx + x;
                        node_of.insert(flat, voxels.len());
                        voxels.push(flat);
                    }
                }
            }
        }

        let mut adjacency = vec![Vec::new(); voxels.len()];
        for (node, &flat) in voxels.iter().enumerate() {
            let z = flat / (ny * nx);
            let rest = flat % (ny * nx);
            let (y, x) = (rest / nx, rest % nx);
            for dz in -1..=1isize {
                for dy in -1..=1isize {
                    for dx in -1..=1isize {
                        if dz == 0 && dy == 0 && dx == 0 {
                            continue;
                        }
                        let (pz, py, px) = (z as isize + dz, y as isize + dy, x as isize + dx);
                        if pz < 0
                            || py < 0
                            || px < 0
                            || pz >= nz as isize
                            || py >= ny as isize
                            || px >= nx as isize
                        {
                            continue;
                        }
                        let neighbor_flat =
                            (pz as usize * ny + py as usize) * nx + px as usize;
                        if let Some(&neighbor) = node_of.get(&neighbor_flat) {
                            adjacency[node].push(neighbor);
                        }
                    }
                }
            }
            adjacency[node].sort_unstable();
        }

        Self {
            shape,
            voxels,
            adjacency,
        }
    }

    /// Volume shape the flat indices refer to.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    /// Number of skeleton voxels.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.voxels.len()
    }

    /// Returns true if the skeleton was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Labels connected components in first-appearance order.
    #[must_use]
    pub fn component_labels(&self) -> (Vec<usize>, usize) {
        let n = self.voxels.len();
        let mut uf = UnionFind::new(n);
        for (node, neighbors) in self.adjacency.iter().enumerate() {
            for &neighbor in neighbors {
                uf.union(node, neighbor);
            }
        }
        let mut labels = vec![0usize; n];
        let mut label_of_root: HashMap<usize, usize> = HashMap::new();
        let mut next = 0usize;
        for node in 0..n {
            let root = uf.find(node);
            let label = *label_of_root.entry(root).or_insert_with(|| {
                let l = next;
                next += 1;
                l
            });
            labels[node] = label;
        }
        (labels, next)
    }

    /// Number of distinct connected skeleton components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_labels().1
    }

    /// Extracts all maximal branches with per-branch statistics.
    ///
    /// `intensity` supplies the underlying intensity volume for the
    /// mean-intensity statistic; it must match the skeleton's shape.
    #[must_use]
    pub fn branches(&self, intensity: Option<&ArrayView3<f32>>) -> Vec<Branch> {
        let (labels, _) = self.component_labels();
        let mut visited: HashSet<(usize, usize)> = HashSet::new();
        let mut branches = Vec::new();

        // Maximal paths anchored at endpoints and junctions.
        for node in 0..self.voxels.len() {
            let degree = self.degree(node);
            if degree == 2 {
                continue;
            }
            if degree == 0 {
                branches.push(self.branch_from_path(&[node], &labels, intensity));
                continue;
            }
            for &neighbor in &self.adjacency[node] {
                if visited.contains(&edge_key(node, neighbor)) {
                    continue;
                }
                let path = self.walk(node, neighbor, &mut visited);
                branches.push(self.branch_from_path(&path, &labels, intensity));
            }
        }

        // Closed loops of pure degree-2 nodes.
        for node in 0..self.voxels.len() {
            if self.degree(node) != 2 {
                continue;
            }
            let Some(&first) = self
                .adjacency[node]
                .iter()
                .find(|&&n| !visited.contains(&edge_key(node, n)))
            else {
                continue;
            };
            let path = self.walk(node, first, &mut visited);
            branches.push(self.branch_from_path(&path, &labels, intensity));
        }

        branches.sort_by(|a, b| {
            (a.endpoint_a, a.endpoint_b, a.voxel_count)
                .cmp(&(b.endpoint_a, b.endpoint_b, b.voxel_count))
        });
        branches
    }

    /// Follows a chain of degree-2 nodes starting along `start -> first`
    /// until a non-degree-2 node or the start node closes a loop.
    fn walk(&self, start: usize, first: usize, visited: &mut HashSet<(usize, usize)>) -> Vec<usize> {
        let mut path = vec![start, first];
        visited.insert(edge_key(start, first));
        let mut prev = start;
        let mut current = first;
        while self.degree(current) == 2 && current != start {
            let next = self.adjacency[current]
                .iter()
                .copied()
                .find(|&n| n != prev)
                .expect("degree-2 node has a second neighbor");
            if !visited.insert(edge_key(current, next)) {
                break;
            }
            path.push(next);
            prev = current;
            current = next;
        }
        path
    }

    fn branch_from_path(
        &self,
        path: &[usize],
        labels: &[usize],
        intensity: Option<&ArrayView3<f32>>,
    ) -> Branch {
        let first = self.voxels[path[0]];
        let last = self.voxels[*path.last().expect("non-empty path")];
        let closed = path.len() > 1 && first == last;

        let mut length = 0.0;
        for pair in path.windows(2) {
            length += self.step_distance(pair[0], pair[1]);
        }

        // Distinct voxels: a closed loop repeats its start at the end.
        let distinct = if closed { &path[..path.len() - 1] } else { path };
        let mean_intensity = intensity.map_or(0.0, |volume| {
            let sum: f64 = distinct
                .iter()
                .map(|&node| {
                    let (z, y, x) = self.coords_of(node);
                    f64::from(volume[[z, y, x]])
                })
                .sum();
            sum / distinct.len() as f64
        });

        Branch {
            endpoint_a: first.min(last),
            endpoint_b: first.max(last),
            length,
            mean_intensity,
            voxel_count: distinct.len(),
            component: labels[path[0]],
        }
    }

    fn coords_of(&self, node: usize) -> (usize, usize, usize) {
        let (_, ny, nx) = self.shape;
        let flat = self.voxels[node];
        let z = flat / (ny * nx);
        let rest = flat % (ny * nx);
        (z, rest / nx, rest % nx)
    }

    fn step_distance(&self, a: usize, b: usize) -> f64 {
        let (az, ay, ax) = self.coords_of(a);
        let (bz, by, bx) = self.coords_of(b);
        let squares = (az.abs_diff(bz) + ay.abs_diff(by) + ax.abs_diff(bx)) as f64;
        squares.sqrt()
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}
