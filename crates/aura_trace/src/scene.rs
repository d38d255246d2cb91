//! Immutable per-tick view of everything the propagation stages read.

use aura_core::{image_sources, ImageSource, Material, MaterialLibrary, Source, Triangle};
use aura_math::{Interval, Ray, Vec3};

use crate::index::SpatialIndex;
use crate::query::{Hit, LinearScene, SceneQuery};

/// Which structure answers ray queries.
#[derive(Debug, Clone, Copy)]
pub enum Backend<'a> {
    Bvh(&'a SpatialIndex),
    Linear(LinearScene<'a>),
}

impl<'a> Backend<'a> {
    pub fn new(index: &'a SpatialIndex, use_bvh: bool) -> Self {
        if use_bvh {
            Backend::Bvh(index)
        } else {
            Backend::Linear(index.linear())
        }
    }
}

impl SceneQuery for Backend<'_> {
    fn nearest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        match self {
            Backend::Bvh(index) => index.nearest_hit(ray, ray_t),
            Backend::Linear(scene) => scene.nearest_hit(ray, ray_t),
        }
    }

    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        match self {
            Backend::Bvh(index) => index.any_hit(ray, ray_t),
            Backend::Linear(scene) => scene.any_hit(ray, ray_t),
        }
    }
}

/// A source together with its image sources, one per scene triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedSource {
    pub source: Source,
    pub images: Vec<ImageSource>,
}

impl TracedSource {
    pub fn new(source: Source, triangles: &[Triangle]) -> Self {
        Self {
            images: image_sources(source.position, triangles),
            source,
        }
    }

    /// Move the source and rebuild its image sources.
    pub fn relocate(&mut self, position: Vec3, triangles: &[Triangle]) {
        self.source.position = position;
        self.images = image_sources(position, triangles);
    }

    /// Identifier carried by this source's arrivals.
    pub fn id(&self) -> u32 {
        self.source.slot as u32
    }

    pub fn position(&self) -> Vec3 {
        self.source.position
    }
}

/// Read-only snapshot shared by every kernel of a dispatch.
#[derive(Debug, Clone, Copy)]
pub struct TraceScene<'a> {
    pub query: Backend<'a>,
    pub triangles: &'a [Triangle],
    pub materials: &'a MaterialLibrary,
    pub sources: &'a [TracedSource],
    pub listener: Vec3,
}

impl<'a> TraceScene<'a> {
    pub fn new(
        index: &'a SpatialIndex,
        use_bvh: bool,
        materials: &'a MaterialLibrary,
        sources: &'a [TracedSource],
        listener: Vec3,
    ) -> Self {
        Self {
            query: Backend::new(index, use_bvh),
            triangles: index.triangles(),
            materials,
            sources,
            listener,
        }
    }

    /// Material of triangle `triangle`, if it is known.
    pub fn material(&self, triangle: usize) -> Option<&'a Material> {
        let tri = self.triangles.get(triangle)?;
        self.materials.get(tri.material_index)
    }
}
