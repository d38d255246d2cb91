//! Bounding Volume Hierarchy over the scene triangles.
//!
//! The tree is a flat node list so it can be cached and uploaded as is.
//! Nodes are split top-down with a sampled surface-area heuristic: five
//! candidate planes per axis, each scored by `half_area * triangle_count`
//! summed over both sides. Triangles are partitioned in place by centroid so
//! every node owns one contiguous range of the reordered triangle list.

use aura_core::Triangle;
use aura_math::{Aabb, Interval, Ray, Vec3};
use bytemuck::{Pod, Zeroable};
use serde::Serialize;
use thiserror::Error;

use crate::query::Hit;
use crate::triangle::intersect;

/// Candidate split planes tested per axis.
const SPLIT_CANDIDATES: usize = 5;

/// Marks an interior node in `triangle_count`.
pub const INTERIOR: i32 = -1;

/// One BVH node.
///
/// Interior nodes store their left child in `index` (the right child is
/// `index + 1`) and [`INTERIOR`] in `triangle_count`. Leaves store the first
/// triangle and the number of triangles.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub min: Vec3,
    pub max: Vec3,
    pub index: i32,
    pub triangle_count: i32,
}

impl BvhNode {
    pub fn leaf(bounds: Aabb, first: usize, count: usize) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            index: first as i32,
            triangle_count: count as i32,
        }
    }

    pub fn interior(bounds: Aabb, left_child: usize) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            index: left_child as i32,
            triangle_count: INTERIOR,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }

    pub fn is_leaf(&self) -> bool {
        self.triangle_count != INTERIOR
    }

    /// Triangle range of a leaf.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.index.max(0) as usize;
        start..start + self.triangle_count.max(0) as usize
    }
}

/// Structural problems found by [`Bvh::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    #[error("BVH has no nodes")]
    Empty,

    #[error("Node {node} points at child {child} but only {count} nodes exist")]
    ChildOutOfRange { node: usize, child: i64, count: usize },

    #[error("Node {node} is reachable more than once")]
    Revisited { node: usize },

    #[error("Leaf {node} covers triangles {start}..{end} of {triangles}")]
    RangeOutOfBounds {
        node: usize,
        start: i64,
        end: i64,
        triangles: usize,
    },

    #[error("Children of node {node} do not cover adjacent triangle ranges")]
    DisjointChildren { node: usize },

    #[error("Bounds of node {node} do not contain its contents")]
    BoundsMismatch { node: usize },

    #[error("Leaves cover {covered} of {triangles} triangles")]
    IncompleteCoverage { covered: usize, triangles: usize },
}

/// Summary of a BVH, as printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    pub largest_leaf: usize,
}

/// Flat BVH. Node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Build a BVH, reordering `triangles` so every leaf owns a contiguous range.
    ///
    /// Splitting stops at `max_depth`, at nodes with at most one triangle,
    /// and where no candidate plane leaves triangles on both sides. An empty
    /// scene yields a single empty leaf.
    pub fn build(triangles: &mut [Triangle], max_depth: u32) -> Self {
        let mut bounds = Aabb::EMPTY;
        for tri in triangles.iter() {
            tri.grow(&mut bounds);
        }

        let mut nodes = vec![BvhNode::leaf(bounds, 0, triangles.len())];
        split(&mut nodes, triangles, 0, 0, max_depth);

        let bvh = Self { nodes };
        log::info!(
            "Built BVH with {} nodes over {} triangles",
            bvh.nodes.len(),
            triangles.len()
        );
        bvh
    }

    /// Wrap nodes restored from a cache.
    pub fn from_nodes(nodes: Vec<BvhNode>) -> Result<Self, BvhError> {
        if nodes.is_empty() {
            return Err(BvhError::Empty);
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    pub fn bounds(&self) -> Aabb {
        self.root().bounds()
    }

    /// Nearest triangle hit inside `ray_t`. Nearer children are visited first.
    pub fn nearest_hit(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let root = self.nodes.first()?;
        let entry = root.bounds().hit(ray, ray_t)?;

        let mut stack: Vec<(usize, f32)> = Vec::with_capacity(64);
        stack.push((0, entry));
        let mut closest = ray_t.max;
        let mut nearest: Option<(usize, f32)> = None;

        while let Some((node_index, entry)) = stack.pop() {
            if entry > closest {
                continue;
            }
            let Some(node) = self.nodes.get(node_index) else {
                continue;
            };

            if node.is_leaf() {
                for i in node.range() {
                    let Some(tri) = triangles.get(i) else { break };
                    if let Some(hit) = intersect(tri, ray, Interval::new(ray_t.min, closest)) {
                        closest = hit.t;
                        nearest = Some((i, hit.t));
                    }
                }
                continue;
            }

            let left = node.index as usize;
            let right = left + 1;
            let search = Interval::new(ray_t.min, closest);
            let hit_left = self.child_entry(left, ray, search);
            let hit_right = self.child_entry(right, ray, search);

            // Push the farther child first so the nearer one is popped next
            match (hit_left, hit_right) {
                (Some(tl), Some(tr)) if tl <= tr => {
                    stack.push((right, tr));
                    stack.push((left, tl));
                }
                (Some(tl), Some(tr)) => {
                    stack.push((left, tl));
                    stack.push((right, tr));
                }
                (Some(tl), None) => stack.push((left, tl)),
                (None, Some(tr)) => stack.push((right, tr)),
                (None, None) => {}
            }
        }

        nearest.map(|(i, t)| Hit::new(ray, t, i, &triangles[i]))
    }

    /// True if any triangle is hit inside `ray_t`.
    pub fn any_hit(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> bool {
        let mut stack: Vec<usize> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(node_index) = stack.pop() {
            let Some(node) = self.nodes.get(node_index) else {
                continue;
            };
            if node.bounds().hit(ray, ray_t).is_none() {
                continue;
            }
            if node.is_leaf() {
                let hit = node
                    .range()
                    .filter_map(|i| triangles.get(i))
                    .any(|tri| intersect(tri, ray, ray_t).is_some());
                if hit {
                    return true;
                }
            } else {
                stack.push(node.index as usize + 1);
                stack.push(node.index as usize);
            }
        }
        false
    }

    fn child_entry(&self, index: usize, ray: &Ray, ray_t: Interval) -> Option<f32> {
        self.nodes.get(index)?.bounds().hit(ray, ray_t)
    }

    /// Check the structural invariants against `triangles`.
    ///
    /// Every node is reached exactly once, leaves partition the triangle
    /// list, a parent's range is the union of its children's, and node
    /// bounds contain their triangles.
    pub fn validate(&self, triangles: &[Triangle]) -> Result<BvhStats, BvhError> {
        if self.nodes.is_empty() {
            return Err(BvhError::Empty);
        }

        let mut walk = Walk {
            nodes: &self.nodes,
            triangles,
            visited: vec![false; self.nodes.len()],
            stats: BvhStats {
                nodes: self.nodes.len(),
                leaves: 0,
                depth: 0,
                largest_leaf: 0,
            },
        };
        let range = walk.visit(0, 0)?;

        if range.start != 0 || range.end != triangles.len() {
            return Err(BvhError::IncompleteCoverage {
                covered: range.len(),
                triangles: triangles.len(),
            });
        }
        Ok(walk.stats)
    }
}

// Bounds written by the builder are exact; allow for cache float noise only.
const BOUNDS_TOLERANCE: f32 = 1e-4;

struct Walk<'a> {
    nodes: &'a [BvhNode],
    triangles: &'a [Triangle],
    visited: Vec<bool>,
    stats: BvhStats,
}

impl Walk<'_> {
    fn visit(&mut self, index: usize, depth: usize) -> Result<std::ops::Range<usize>, BvhError> {
        if std::mem::replace(&mut self.visited[index], true) {
            return Err(BvhError::Revisited { node: index });
        }
        self.stats.depth = self.stats.depth.max(depth);
        let node = self.nodes[index];
        let bounds = node.bounds();

        if node.is_leaf() {
            let (start, count) = (node.index as i64, node.triangle_count as i64);
            if start < 0 || count < 0 || start + count > self.triangles.len() as i64 {
                return Err(BvhError::RangeOutOfBounds {
                    node: index,
                    start,
                    end: start + count,
                    triangles: self.triangles.len(),
                });
            }
            let range = node.range();
            for tri in &self.triangles[range.clone()] {
                if !tri
                    .positions()
                    .iter()
                    .all(|&p| bounds.contains_point(p, BOUNDS_TOLERANCE))
                {
                    return Err(BvhError::BoundsMismatch { node: index });
                }
            }
            self.stats.leaves += 1;
            self.stats.largest_leaf = self.stats.largest_leaf.max(range.len());
            return Ok(range);
        }

        let left = node.index as i64;
        if left < 0 || left + 1 >= self.nodes.len() as i64 {
            return Err(BvhError::ChildOutOfRange {
                node: index,
                child: left,
                count: self.nodes.len(),
            });
        }
        let (left, right) = (left as usize, left as usize + 1);

        for child in [left, right] {
            let child_bounds = self.nodes[child].bounds();
            if !child_bounds.is_empty()
                && !(bounds.contains_point(child_bounds.min, BOUNDS_TOLERANCE)
                    && bounds.contains_point(child_bounds.max, BOUNDS_TOLERANCE))
            {
                return Err(BvhError::BoundsMismatch { node: index });
            }
        }

        let left_range = self.visit(left, depth + 1)?;
        let right_range = self.visit(right, depth + 1)?;
        if left_range.end != right_range.start {
            return Err(BvhError::DisjointChildren { node: index });
        }
        Ok(left_range.start..right_range.end)
    }
}

fn split(
    nodes: &mut Vec<BvhNode>,
    triangles: &mut [Triangle],
    node_index: usize,
    depth: u32,
    max_depth: u32,
) {
    if depth >= max_depth {
        return;
    }
    let node = nodes[node_index];
    let range = node.range();
    if range.len() <= 1 {
        return;
    }

    let Some((axis, position)) = choose_split(&node.bounds(), &triangles[range.clone()]) else {
        return;
    };

    let (left_count, left_bounds, right_bounds) =
        partition(&mut triangles[range.clone()], axis, position);
    if left_count == 0 || left_count == range.len() {
        return;
    }

    let child = nodes.len();
    nodes[node_index] = BvhNode::interior(node.bounds(), child);
    nodes.push(BvhNode::leaf(left_bounds, range.start, left_count));
    nodes.push(BvhNode::leaf(
        right_bounds,
        range.start + left_count,
        range.len() - left_count,
    ));

    split(nodes, triangles, child, depth + 1, max_depth);
    split(nodes, triangles, child + 1, depth + 1, max_depth);
}

/// Cheapest candidate plane as `(axis, position)`, if any splits the set.
fn choose_split(bounds: &Aabb, triangles: &[Triangle]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32, f32)> = None;

    for axis in 0..3 {
        for i in 0..SPLIT_CANDIDATES {
            let t = (i + 1) as f32 / (SPLIT_CANDIDATES + 1) as f32;
            let position = bounds.min[axis] + (bounds.max[axis] - bounds.min[axis]) * t;
            let Some(cost) = split_cost(triangles, axis, position) else {
                continue;
            };
            if best.map_or(true, |(_, _, best_cost)| cost < best_cost) {
                best = Some((axis, position, cost));
            }
        }
    }

    best.map(|(axis, position, _)| (axis, position))
}

/// Surface-area cost of splitting at `position`, `None` if a side is empty.
fn split_cost(triangles: &[Triangle], axis: usize, position: f32) -> Option<f32> {
    let mut left = Aabb::EMPTY;
    let mut right = Aabb::EMPTY;
    let mut left_count = 0usize;
    let mut right_count = 0usize;

    for tri in triangles {
        if tri.centroid()[axis] < position {
            tri.grow(&mut left);
            left_count += 1;
        } else {
            tri.grow(&mut right);
            right_count += 1;
        }
    }

    if left_count == 0 || right_count == 0 {
        return None;
    }
    let cost = left.half_area() * left_count as f32 + right.half_area() * right_count as f32;
    cost.is_finite().then_some(cost)
}

/// Move triangles with centroid below `position` to the front.
///
/// Returns the number moved and the bounds of both sides. Not stable.
fn partition(triangles: &mut [Triangle], axis: usize, position: f32) -> (usize, Aabb, Aabb) {
    let mut left_bounds = Aabb::EMPTY;
    let mut right_bounds = Aabb::EMPTY;
    let mut left_count = 0;

    for i in 0..triangles.len() {
        if triangles[i].centroid()[axis] < position {
            triangles[i].grow(&mut left_bounds);
            triangles.swap(i, left_count);
            left_count += 1;
        } else {
            triangles[i].grow(&mut right_bounds);
        }
    }

    (left_count, left_bounds, right_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::GeometryBuilder;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::query::{LinearScene, SceneQuery};

    fn random_triangles(count: usize, seed: u64) -> Vec<Triangle> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                let center = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                let mut corner = || {
                    center
                        + Vec3::new(
                            rng.gen_range(-0.5..0.5),
                            rng.gen_range(-0.5..0.5),
                            rng.gen_range(-0.5..0.5),
                        )
                };
                let (a, b, c) = (corner(), corner(), corner());
                Triangle::flat(a, b, c, i as u32)
            })
            .collect()
    }

    #[test]
    fn test_node_layout_matches_cache_record() {
        assert_eq!(std::mem::size_of::<BvhNode>(), 32);
    }

    #[test]
    fn test_empty_scene_is_single_empty_leaf() {
        let bvh = Bvh::build(&mut [], 8);
        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.root().is_leaf());
        assert_eq!(bvh.root().triangle_count, 0);
        assert!(bvh.bounds().is_empty());

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(bvh.nearest_hit(&[], &ray, Interval::FORWARD).is_none());
        assert!(!bvh.any_hit(&[], &ray, Interval::FORWARD));
        assert!(bvh.validate(&[]).is_ok());
    }

    #[test]
    fn test_single_triangle_never_splits() {
        let mut tris = random_triangles(1, 1);
        let bvh = Bvh::build(&mut tris, 8);
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.root().range(), 0..1);
    }

    #[test]
    fn test_depth_zero_keeps_root_leaf() {
        let mut tris = random_triangles(50, 2);
        let bvh = Bvh::build(&mut tris, 0);
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.root().triangle_count, 50);
    }

    #[test]
    fn test_leaves_partition_triangles() {
        let mut tris = random_triangles(500, 3);
        let mut before: Vec<u32> = tris.iter().map(|t| t.material_index).collect();
        let bvh = Bvh::build(&mut tris, 12);

        let stats = bvh.validate(&tris).unwrap();
        assert!(stats.leaves > 1);
        assert!(stats.depth <= 12);
        assert_eq!(stats.nodes, stats.leaves * 2 - 1);

        // Reordering is a permutation
        let mut after: Vec<u32> = tris.iter().map(|t| t.material_index).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_sibling_leaves_are_adjacent() {
        let mut tris = random_triangles(64, 4);
        let bvh = Bvh::build(&mut tris, 4);
        let mut checked = 0;
        for node in bvh.nodes().iter().filter(|n| !n.is_leaf()) {
            let left = &bvh.nodes()[node.index as usize];
            let right = &bvh.nodes()[node.index as usize + 1];
            if left.is_leaf() && right.is_leaf() {
                assert_eq!(left.range().end, right.range().start);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_identical_centroids_stay_leaf() {
        // No plane can separate identical triangles
        let tri = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::Y, 0);
        let mut tris = vec![tri; 10];
        let bvh = Bvh::build(&mut tris, 8);
        assert_eq!(bvh.nodes().len(), 1);
    }

    #[test]
    fn test_bvh_matches_linear_scene() {
        let mut tris = random_triangles(300, 5);
        let bvh = Bvh::build(&mut tris, 10);
        let linear = LinearScene::new(&tris);
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-12.0..12.0),
                rng.gen_range(-12.0..12.0),
                rng.gen_range(-12.0..12.0),
            );
            let direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize_or_zero();
            if direction == Vec3::ZERO {
                continue;
            }
            let ray = Ray::new(origin, direction);

            let expected = linear.nearest_hit(&ray, Interval::FORWARD);
            let actual = bvh.nearest_hit(&tris, &ray, Interval::FORWARD);
            match (expected, actual) {
                (Some(e), Some(a)) => assert!((e.t - a.t).abs() < 1e-4),
                (None, None) => {}
                other => panic!("BVH and linear scene disagree: {other:?}"),
            }
            assert_eq!(
                linear.any_hit(&ray, Interval::FORWARD),
                bvh.any_hit(&tris, &ray, Interval::FORWARD)
            );
        }
    }

    #[test]
    fn test_shoebox_from_inside() {
        let mut builder = GeometryBuilder::new();
        builder.add_shoebox(Vec3::splat(-10.0), Vec3::splat(10.0), 0);
        let mut tris = builder.finish().triangles;
        let bvh = Bvh::build(&mut tris, 8);
        bvh.validate(&tris).unwrap();

        let hit = bvh
            .nearest_hit(&tris, &Ray::new(Vec3::ZERO, Vec3::Y), Interval::FORWARD)
            .unwrap();
        assert!((hit.t - 10.0).abs() < 1e-5);
        assert!(hit.front_face);
        assert_eq!(hit.normal, -Vec3::Y);
    }

    #[test]
    fn test_validate_catches_broken_trees() {
        let mut tris = random_triangles(32, 7);
        let bvh = Bvh::build(&mut tris, 6);

        // Leaf range past the end
        let mut nodes = bvh.nodes().to_vec();
        let leaf = nodes.iter().position(|n| n.is_leaf()).unwrap();
        nodes[leaf].triangle_count += 100;
        let broken = Bvh::from_nodes(nodes).unwrap();
        assert!(broken.validate(&tris).is_err());

        // Child pointing at itself
        let mut nodes = bvh.nodes().to_vec();
        nodes[0].index = 0;
        let broken = Bvh::from_nodes(nodes).unwrap();
        assert!(broken.validate(&tris).is_err());

        assert_eq!(Bvh::from_nodes(Vec::new()), Err(BvhError::Empty));
    }
}
