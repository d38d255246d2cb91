//! The scene's spatial index: frozen triangles plus their BVH.

use std::sync::Arc;

use aura_core::Triangle;
use aura_math::{Aabb, Interval, Ray};

use crate::bvh::{Bvh, BvhError, BvhStats};
use crate::query::{Hit, LinearScene, SceneQuery};

/// Triangles in BVH order and the BVH built over them.
///
/// Read-only once built; tracing threads share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    triangles: Arc<[Triangle]>,
    bvh: Bvh,
}

impl SpatialIndex {
    /// Reorder `triangles` into a BVH and freeze them.
    pub fn build(mut triangles: Vec<Triangle>, max_depth: u32) -> Self {
        let bvh = Bvh::build(&mut triangles, max_depth);
        Self {
            triangles: triangles.into(),
            bvh,
        }
    }

    /// Pair cached triangles with a cached BVH, checking they belong together.
    pub fn from_parts(triangles: Vec<Triangle>, bvh: Bvh) -> Result<Self, BvhError> {
        bvh.validate(&triangles)?;
        Ok(Self {
            triangles: triangles.into(),
            bvh,
        })
    }

    pub fn triangles(&self) -> &Arc<[Triangle]> {
        &self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn bounds(&self) -> Aabb {
        self.bvh.bounds()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn stats(&self) -> Result<BvhStats, BvhError> {
        self.bvh.validate(&self.triangles)
    }

    /// Brute-force view over the same triangles.
    pub fn linear(&self) -> LinearScene<'_> {
        LinearScene::new(&self.triangles)
    }
}

impl SceneQuery for SpatialIndex {
    fn nearest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        self.bvh.nearest_hit(&self.triangles, ray, ray_t)
    }

    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.bvh.any_hit(&self.triangles, ray, ray_t)
    }
}
