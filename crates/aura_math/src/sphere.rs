use std::f32::consts::PI;

use crate::Vec3;

/// Quasi-uniform directions over the unit sphere (golden-angle spiral).
///
/// The set is deterministic for a given `count`, so direction `i` means the
/// same thing on every frame.
pub fn golden_spiral(count: usize) -> Vec<Vec3> {
    let increment = PI * (3.0 - 5.0_f32.sqrt());
    let offset = 2.0 / count as f32;

    (0..count)
        .map(|i| {
            let y = i as f32 * offset - 1.0 + offset / 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let phi = i as f32 * increment;
            Vec3::new(phi.cos() * r, y, phi.sin() * r)
        })
        .collect()
}

/// Mirror `direction` about the plane with unit normal `normal`.
#[inline]
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - 2.0 * direction.dot(normal) * normal
}
