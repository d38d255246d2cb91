//! Aura math - geometric primitives shared by the tracer and the engine.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod sphere;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use sphere::{golden_spiral, reflect};

/// Guard used for divisions by distances or energies that may collapse to zero.
pub const EPSILON: f32 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glam_reexport() {
        let v = Vec3::new(1.0, 2.0, 3.0) + Vec3::ONE;
        assert_eq!(v, Vec3::new(2.0, 3.0, 4.0));
    }
}
