use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for the scene BVH.
///
/// Stored as two corners so it maps one-to-one onto the node layout of the
/// BVH cache.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from its two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Grow the box so it contains `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// True until something has been grown into the box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half of the surface area, `x*y + x*z + y*z`.
    ///
    /// Used as the split heuristic weight; an empty box yields infinity.
    pub fn half_area(&self) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }
        let e = self.size();
        e.x * e.y + e.x * e.z + e.y * e.z
    }

    /// Enclosed volume in cubic meters (0 for an empty box).
    pub fn volume(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.size();
        e.x * e.y * e.z
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True if `point` lies inside the box (inclusive, with `tolerance` slack).
    pub fn contains_point(&self, point: Vec3, tolerance: f32) -> bool {
        point.cmpge(self.min - Vec3::splat(tolerance)).all()
            && point.cmple(self.max + Vec3::splat(tolerance)).all()
    }

    /// Ray parameter at which the ray enters the box, if it does within `ray_t`.
    ///
    /// Uses the slab method. A ray starting inside the box enters at `ray_t.min`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let mut t_min = ray_t.min;
        let mut t_max = ray_t.max;

        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // NaN from 0 * inf (ray on a slab plane) leaves the bound untouched
            t_min = if t0 > t_min { t0 } else { t_min };
            t_max = if t1 < t_max { t1 } else { t_max };
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min)
    }

    /// An inverted box that contains nothing; growing it yields the grown point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_grow_from_empty() {
        let mut aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());

        aabb.grow(Vec3::new(1.0, 2.0, 3.0));
        aabb.grow(Vec3::new(-1.0, 0.0, 5.0));

        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_aabb_half_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.half_area(), 1.0 * 2.0 + 1.0 * 3.0 + 2.0 * 3.0);
        assert_eq!(Aabb::EMPTY.half_area(), f32::INFINITY);
    }

    #[test]
    fn test_aabb_volume() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.volume(), 24.0);
        assert_eq!(Aabb::EMPTY.volume(), 0.0);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let t = aabb.hit(&ray, Interval::FORWARD).unwrap();
        assert!((t - 4.0).abs() < 1e-6);

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.hit(&ray, Interval::FORWARD).is_none());

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::FORWARD).is_none());

        // Box beyond the interval
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 3.0)).is_none());
    }

    #[test]
    fn test_aabb_hit_from_inside() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(aabb.hit(&ray, Interval::FORWARD), Some(0.0));
    }

    #[test]
    fn test_aabb_hit_flat_box() {
        // Zero-thickness box, as produced by a single axis-aligned triangle
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(aabb.hit(&ray, Interval::FORWARD).is_some());
    }

    #[test]
    fn test_empty_aabb_never_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(Aabb::EMPTY.hit(&ray, Interval::FORWARD).is_none());
    }
}
