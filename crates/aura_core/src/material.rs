//! Acoustic surface materials.

use serde::{Deserialize, Serialize};

use crate::band::NUM_BANDS;

/// Upper edge of each frequency band in Hz.
///
/// Band 0 covers 0-110 Hz, band 1 110-630 Hz, band 2 630-3500 Hz and
/// band 3 3500-22050 Hz.
pub const BAND_EDGES_HZ: [f32; NUM_BANDS] = [110.0, 630.0, 3500.0, 22050.0];

/// Four-band absorption and scattering coefficients of a surface.
///
/// Coefficients live in `[0, 1]`; values outside are clamped when the
/// material is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name (for logs and asset lookup)
    pub name: String,

    /// Fraction of incident energy absorbed per band
    pub absorption: [f32; NUM_BANDS],

    /// Fraction of reflected energy scattered diffusely per band
    pub scattering: [f32; NUM_BANDS],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            absorption: [0.0; NUM_BANDS],
            scattering: [0.0; NUM_BANDS],
        }
    }
}

impl Material {
    /// Create a new material, clamping coefficients into `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        absorption: [f32; NUM_BANDS],
        scattering: [f32; NUM_BANDS],
    ) -> Self {
        let mut material = Self {
            name: name.into(),
            absorption,
            scattering,
        };
        material.clamp_coefficients();
        material
    }

    /// Material with the same coefficients in every band.
    pub fn uniform(name: impl Into<String>, absorption: f32, scattering: f32) -> Self {
        Self::new(name, [absorption; NUM_BANDS], [scattering; NUM_BANDS])
    }

    /// Absorption of the band containing `frequency` (0 outside 0-22050 Hz).
    pub fn absorption_at(&self, frequency: f32) -> f32 {
        band_index(frequency).map_or(0.0, |b| self.absorption[b])
    }

    /// Scattering of the band containing `frequency` (0 outside 0-22050 Hz).
    pub fn scattering_at(&self, frequency: f32) -> f32 {
        band_index(frequency).map_or(0.0, |b| self.scattering[b])
    }

    /// Average scattering coefficient across bands.
    pub fn mean_scattering(&self) -> f32 {
        self.scattering.iter().sum::<f32>() / NUM_BANDS as f32
    }

    /// Clamp every coefficient into `[0, 1]`, warning about values that moved.
    ///
    /// Deserialized materials bypass `new`, so loaders call this explicitly.
    pub fn clamp_coefficients(&mut self) {
        for c in self.absorption.iter_mut().chain(self.scattering.iter_mut()) {
            let clamped = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
            if clamped != *c {
                log::warn!(
                    "Material '{}': coefficient {} clamped to {}",
                    self.name,
                    c,
                    clamped
                );
                *c = clamped;
            }
        }
    }
}

/// Index of the band containing `frequency`, `None` outside 0-22050 Hz.
pub fn band_index(frequency: f32) -> Option<usize> {
    if frequency < 0.0 {
        return None;
    }
    BAND_EDGES_HZ.iter().position(|&edge| frequency <= edge)
}

/// Ordered set of materials; triangles refer to them by index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material and return the index triangles should use for it.
    pub fn add(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<&Material> {
        self.materials.get(index as usize)
    }

    /// Index of the material called `name`.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Clamp the coefficients of every material (after deserializing).
    pub fn sanitize(&mut self) {
        for material in &mut self.materials {
            material.clamp_coefficients();
        }
    }
}

impl From<Vec<Material>> for MaterialLibrary {
    fn from(materials: Vec<Material>) -> Self {
        let mut library = Self { materials };
        library.sanitize();
        library
    }
}
