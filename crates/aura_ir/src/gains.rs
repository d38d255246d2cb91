//! Per-band gains applied when bands are summed into one signal.

use aura_core::NUM_BANDS;

/// Bandwidth of each energy band in Hz.
pub const BAND_WIDTHS_HZ: [f32; NUM_BANDS] = [110.0, 520.0, 2870.0, 18550.0];

/// Fixed gain per band and a tunable mix weight per band.
///
/// The fixed gain `sqrt(bandwidth / nyquist)` keeps white noise split into
/// bands at the loudness of the unsplit signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMix {
    pub gains: [f32; NUM_BANDS],
    pub weights: [f32; NUM_BANDS],
}

impl BandMix {
    pub fn new(sample_rate: u32, weights: [f32; NUM_BANDS]) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        Self {
            gains: BAND_WIDTHS_HZ.map(|bandwidth| (bandwidth / nyquist).sqrt()),
            weights,
        }
    }

    /// Effective multiplier of band `band`.
    pub fn factor(&self, band: usize) -> f32 {
        self.gains[band] * self.weights[band]
    }

    /// Mix per-band values into one.
    pub fn combine(&self, values: [f32; NUM_BANDS]) -> f32 {
        values
            .iter()
            .enumerate()
            .map(|(band, value)| value * self.factor(band))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gains_at_44100() {
        let mix = BandMix::new(44100, [1.0; NUM_BANDS]);
        assert!((mix.gains[0] - (110.0f32 / 22050.0).sqrt()).abs() < 1e-7);
        assert!((mix.gains[3] - (18550.0f32 / 22050.0).sqrt()).abs() < 1e-7);

        // Bandwidths add up to the Nyquist band
        let power: f32 = mix.gains.iter().map(|g| g * g).sum();
        assert!((power - 22050.0 / 22050.0).abs() < 1e-5);
    }

    #[test]
    fn test_weights_scale_bands() {
        let mix = BandMix::new(48000, [1.0, 0.0, 0.5, 0.0]);
        let value = mix.combine([1.0, 1.0, 1.0, 1.0]);
        assert!((value - (mix.gains[0] + 0.5 * mix.gains[2])).abs() < 1e-7);
    }
}
