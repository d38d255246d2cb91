use crate::Vec3;

/// A ray in 3D space with origin and direction.
///
/// The direction is expected to be unit length so that ray parameters are
/// distances in meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `origin` towards `target`, together with the distance between them.
    ///
    /// Returns `None` when the two points coincide.
    pub fn towards(origin: Vec3, target: Vec3) -> Option<(Self, f32)> {
        let offset = target - origin;
        let distance = offset.length();
        if distance < crate::EPSILON {
            return None;
        }
        Some((Self::new(origin, offset / distance), distance))
    }

    /// Get the point along the ray at parameter t.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
