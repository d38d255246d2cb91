//! Four-band energy values carried by rays and arrivals.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// Number of frequency bands tracked through the simulation.
pub const NUM_BANDS: usize = 4;

/// Energy per frequency band.
///
/// Components are never negative: every constructor and operation clamps
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyBand([f32; NUM_BANDS]);

impl EnergyBand {
    pub const ZERO: EnergyBand = EnergyBand([0.0; NUM_BANDS]);

    /// Same energy in every band.
    pub fn splat(energy: f32) -> Self {
        Self::new([energy; NUM_BANDS])
    }

    pub fn new(bands: [f32; NUM_BANDS]) -> Self {
        Self(bands.map(clamp_energy))
    }

    pub fn bands(&self) -> [f32; NUM_BANDS] {
        self.0
    }

    pub fn get(&self, band: usize) -> f32 {
        self.0[band]
    }

    /// Multiply by a scalar factor.
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.0.map(|e| e * factor))
    }

    /// Multiply band-wise by `(1 - coefficient)`, e.g. to remove absorbed energy.
    pub fn attenuate(self, coefficients: [f32; NUM_BANDS]) -> Self {
        let mut out = self.0;
        for (e, c) in out.iter_mut().zip(coefficients) {
            *e *= 1.0 - c.clamp(0.0, 1.0);
        }
        Self::new(out)
    }

    /// True when every band is strictly below `threshold`.
    pub fn below(&self, threshold: f32) -> bool {
        self.0.iter().all(|&e| e < threshold)
    }

    /// True when no band carries any energy.
    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|&e| e <= 0.0)
    }

    /// Largest band value.
    pub fn max_band(&self) -> f32 {
        self.0.iter().copied().fold(0.0, f32::max)
    }
}

// NaN and negative values both collapse to zero
fn clamp_energy(e: f32) -> f32 {
    if e > 0.0 {
        e
    } else {
        0.0
    }
}

impl Add for EnergyBand {
    type Output = EnergyBand;

    fn add(self, rhs: EnergyBand) -> EnergyBand {
        let mut out = self.0;
        for (a, b) in out.iter_mut().zip(rhs.0) {
            *a += b;
        }
        EnergyBand::new(out)
    }
}

impl AddAssign for EnergyBand {
    fn add_assign(&mut self, rhs: EnergyBand) {
        *self = *self + rhs;
    }
}

/// Band-wise product.
impl Mul for EnergyBand {
    type Output = EnergyBand;

    fn mul(self, rhs: EnergyBand) -> EnergyBand {
        let mut out = self.0;
        for (a, b) in out.iter_mut().zip(rhs.0) {
            *a *= b;
        }
        EnergyBand::new(out)
    }
}
