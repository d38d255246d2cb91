//! Scene query surface used by the propagation stages.

use aura_core::Triangle;
use aura_math::{Interval, Ray, Vec3};

use crate::triangle::intersect;

/// Closest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the ray.
    pub t: f32,
    /// Index into the scene's triangle list.
    pub triangle: usize,
    pub point: Vec3,
    /// Plane normal, always pointing against the ray.
    pub normal: Vec3,
    /// Whether the ray struck the side the plane normal points to.
    pub front_face: bool,
}

impl Hit {
    pub(crate) fn new(ray: &Ray, t: f32, triangle: usize, tri: &Triangle) -> Self {
        let outward = tri.plane_normal();
        let front_face = ray.direction.dot(outward) < 0.0;
        Self {
            t,
            triangle,
            point: ray.at(t),
            normal: if front_face { outward } else { -outward },
            front_face,
        }
    }
}

/// Ray queries against a static triangle scene.
pub trait SceneQuery: Send + Sync {
    /// The nearest hit inside `ray_t`.
    fn nearest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit>;

    /// True if anything is hit inside `ray_t`.
    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.nearest_hit(ray, ray_t).is_some()
    }

    /// True if the open segment between `from` and `to` is unobstructed.
    ///
    /// Both ends are pulled in by [`Interval::SURFACE_OFFSET`] so points
    /// lying on a surface do not occlude themselves.
    fn is_visible(&self, from: Vec3, to: Vec3) -> bool {
        match Ray::towards(from, to) {
            Some((ray, distance)) => {
                let ray_t = Interval::new(
                    Interval::SURFACE_OFFSET,
                    distance - Interval::SURFACE_OFFSET,
                );
                ray_t.size() <= 0.0 || !self.any_hit(&ray, ray_t)
            }
            None => true,
        }
    }
}

/// Brute-force scene that tests every triangle.
#[derive(Debug, Clone, Copy)]
pub struct LinearScene<'a> {
    triangles: &'a [Triangle],
}

impl<'a> LinearScene<'a> {
    pub fn new(triangles: &'a [Triangle]) -> Self {
        Self { triangles }
    }
}

impl SceneQuery for LinearScene<'_> {
    fn nearest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let mut closest = ray_t.max;
        let mut nearest = None;
        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(hit) = intersect(tri, ray, Interval::new(ray_t.min, closest)) {
                closest = hit.t;
                nearest = Some((i, hit.t));
            }
        }
        nearest.map(|(i, t)| Hit::new(ray, t, i, &self.triangles[i]))
    }

    fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.triangles
            .iter()
            .any(|tri| intersect(tri, ray, ray_t).is_some())
    }
}
