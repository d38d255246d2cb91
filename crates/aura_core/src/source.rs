//! Sound sources, their image sources and the output slot pool.

use std::collections::BTreeSet;

use aura_math::Vec3;

use crate::error::CapacityError;
use crate::geometry::Triangle;

/// A live sound source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    pub position: Vec3,
    /// Capture radius for stochastic rays, in meters.
    pub radius: f32,
    /// Output channel on the reverb sink.
    pub slot: usize,
}

impl Source {
    pub fn new(position: Vec3, radius: f32, slot: usize) -> Self {
        Self {
            position,
            radius,
            slot,
        }
    }
}

/// A source mirrored across one triangle's plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSource {
    pub position: Vec3,
    pub valid: bool,
}

impl ImageSource {
    pub const INVALID: ImageSource = ImageSource {
        position: Vec3::ZERO,
        valid: false,
    };

    /// Mirror `source` across the plane of `triangle`.
    ///
    /// The image is invalid when the source lies on or behind the plane, or
    /// when the triangle is degenerate.
    pub fn reflect(source: Vec3, triangle: &Triangle) -> Self {
        let normal = triangle.plane_normal();
        let to_source = source - triangle.pos_a;
        let side = to_source.dot(normal);
        if side <= 0.0 {
            return Self::INVALID;
        }
        Self {
            position: source - 2.0 * side * normal,
            valid: true,
        }
    }

    /// Fraction of the source energy this image can contribute.
    pub fn weight(&self) -> f32 {
        if self.valid {
            1.0
        } else {
            0.0
        }
    }
}

/// Image sources of one source, one per scene triangle.
pub fn image_sources(source: Vec3, triangles: &[Triangle]) -> Vec<ImageSource> {
    triangles
        .iter()
        .map(|tri| ImageSource::reflect(source, tri))
        .collect()
}

/// Bounded pool of output slots handing out the smallest free index first.
#[derive(Debug, Clone)]
pub struct SlotPool {
    free: BTreeSet<usize>,
    capacity: usize,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: (0..capacity).collect(),
            capacity,
        }
    }

    pub fn allocate(&mut self) -> Result<usize, CapacityError> {
        self.free.pop_first().ok_or(CapacityError::SlotsExhausted {
            capacity: self.capacity,
        })
    }

    /// Return `slot` to the pool. Returns false if it was not in use.
    pub fn release(&mut self, slot: usize) -> bool {
        if slot >= self.capacity {
            return false;
        }
        self.free.insert(slot)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

}
