//! Ray-triangle intersection.
//!
//! Uses the Möller-Trumbore algorithm. Both faces are hit; the caller decides
//! what a back-face hit means.

use aura_core::Triangle;
use aura_math::{Interval, Ray};

/// Barycentric hit on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Intersect `ray` with `tri` inside `ray_t`.
pub fn intersect(tri: &Triangle, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
    let edge1 = tri.pos_b - tri.pos_a;
    let edge2 = tri.pos_c - tri.pos_a;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < 1e-8 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - tri.pos_a;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if !ray_t.contains(t) {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_math::Vec3;

    fn unit_triangle() -> Triangle {
        Triangle::flat(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            0,
        )
    }

    #[test]
    fn test_front_and_back_face_hits() {
        let tri = unit_triangle();

        let front = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let hit = intersect(&tri, &front, Interval::FORWARD).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-6);

        let back = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        let hit = intersect(&tri, &back, Interval::FORWARD).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_miss_outside_and_parallel() {
        let tri = unit_triangle();

        let outside = Ray::new(Vec3::new(5.0, 0.0, 2.0), -Vec3::Z);
        assert!(intersect(&tri, &outside, Interval::FORWARD).is_none());

        let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(intersect(&tri, &parallel, Interval::FORWARD).is_none());
    }

    #[test]
    fn test_interval_limits_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        assert!(intersect(&tri, &ray, Interval::new(0.0, 1.5)).is_none());

        let behind = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert!(intersect(&tri, &behind, Interval::FORWARD).is_none());
    }
}
