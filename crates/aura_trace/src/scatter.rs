//! Reflection directions.

use std::f32::consts::PI;

use aura_math::{reflect, Vec3};
use rand::Rng;

/// Cosine-weighted direction on the hemisphere around `normal` (Malley's method).
pub fn cosine_hemisphere<R: Rng + ?Sized>(normal: Vec3, rng: &mut R) -> Vec3 {
    let arbitrary = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = normal.cross(arbitrary).normalize_or_zero();
    let bitangent = normal.cross(tangent);

    let u1: f32 = rng.gen();
    let u2: f32 = rng.gen();
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;

    tangent * (r * phi.cos()) + bitangent * (r * phi.sin()) + normal * (1.0 - u1).max(0.0).sqrt()
}

/// Vector-based scattering: blend the mirror direction towards a random
/// diffuse direction by `scattering` in `[0, 1]`.
///
/// `normal` must face the incoming ray.
pub fn scatter<R: Rng + ?Sized>(incident: Vec3, normal: Vec3, scattering: f32, rng: &mut R) -> Vec3 {
    let mirror = reflect(incident, normal);
    let s = scattering.clamp(0.0, 1.0);
    if s <= 0.0 {
        return mirror;
    }
    let diffuse = cosine_hemisphere(normal, rng);
    mirror.lerp(diffuse, s).try_normalize().unwrap_or(normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cosine_hemisphere_stays_above_surface() {
        let mut rng = StdRng::seed_from_u64(1);
        let n = Vec3::new(0.0, 0.6, 0.8);
        let mut cos_sum = 0.0;
        for _ in 0..10_000 {
            let d = cosine_hemisphere(n, &mut rng);
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.dot(n) >= 0.0);
            cos_sum += d.dot(n);
        }
        // Mean cosine of a cosine-weighted hemisphere is 2/3
        assert!((cos_sum / 10_000.0 - 2.0 / 3.0).abs() < 0.02);
    }

    #[test]
    fn test_zero_scattering_is_mirror() {
        let mut rng = StdRng::seed_from_u64(2);
        let d = scatter(Vec3::new(1.0, -1.0, 0.0).normalize(), Vec3::Y, 0.0, &mut rng);
        assert!((d - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_scattered_direction_leaves_surface() {
        let mut rng = StdRng::seed_from_u64(3);
        for s in [0.25, 0.5, 1.0] {
            for _ in 0..1000 {
                let d = scatter(Vec3::new(0.3, -1.0, 0.1).normalize(), Vec3::Y, s, &mut rng);
                assert!((d.length() - 1.0).abs() < 1e-4);
                assert!(d.y >= 0.0);
            }
        }
    }
}
