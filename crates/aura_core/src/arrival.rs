//! Arrival events and the energy histogram built from them.

use crate::band::EnergyBand;

/// Speed of sound in air, meters per second.
pub const SPEED_OF_SOUND: f32 = 343.0;

/// How an arrival reached the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Direct,
    Specular,
    Diffuse,
}

/// Energy that reached the listener from one source along one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayArrival {
    /// Ray index, triangle index for image sources, 0 for the direct path.
    pub direction_id: u32,
    pub source_id: u32,
    pub energy: EnergyBand,
    /// Total path length in meters.
    pub distance: f32,
    pub kind: PathKind,
}

impl RayArrival {
    /// Travel time in seconds.
    pub fn arrival_time(&self) -> f32 {
        self.distance / SPEED_OF_SOUND
    }
}

/// Arrival energy accumulated into fixed-width time bins.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyHistogram {
    /// Bin width in seconds.
    pub bin_size: f32,
    pub bins: Vec<EnergyBand>,
}

impl EnergyHistogram {
    pub fn new(bin_size: f32, bin_count: usize) -> Self {
        Self {
            bin_size,
            bins: vec![EnergyBand::ZERO; bin_count],
        }
    }

    /// Bin the arrivals of `source_id`, dropping any past the last bin.
    /// Also returns how many were binned.
    pub fn from_arrivals<'a>(
        arrivals: impl IntoIterator<Item = &'a RayArrival>,
        source_id: u32,
        bin_size: f32,
        bin_count: usize,
    ) -> (Self, usize) {
        let mut histogram = Self::new(bin_size, bin_count);
        let binned = arrivals
            .into_iter()
            .filter(|a| a.source_id == source_id)
            .filter(|a| histogram.add(a))
            .count();
        (histogram, binned)
    }

    /// Add one arrival. Returns false if it falls outside the histogram.
    pub fn add(&mut self, arrival: &RayArrival) -> bool {
        let bin = (arrival.arrival_time() / self.bin_size).floor();
        if !(bin >= 0.0) || bin as usize >= self.bins.len() {
            return false;
        }
        self.bins[bin as usize] += arrival.energy;
        true
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.bins.iter().all(EnergyBand::is_silent)
    }
}
