//! Shapes band-split noise to follow an energy histogram.

use aura_core::{EnergyHistogram, NUM_BANDS};

use crate::gains::BandMix;
use crate::response::ResponseBuffer;

/// Guards the per-bin rescale against silent noise.
const RESCALE_EPSILON: f32 = 1e-8;

/// Overwrite `buffer` with `noise` rescaled bin by bin to `histogram`.
///
/// Within histogram bin `k` (samples `floor(k * fs * bin_size)` up to the next
/// bin) band `b` is scaled by `sqrt(E[k][b] / (noise energy + eps))`. The bands
/// are then mixed with `mix`. Bins with no target energy are left untouched.
pub fn shape_noise(
    buffer: &mut ResponseBuffer,
    noise: &[Vec<f32>; NUM_BANDS],
    histogram: &EnergyHistogram,
    mix: &BandMix,
    sample_rate: u32,
) {
    let len = noise.iter().map(Vec::len).min().unwrap_or(0).min(buffer.len());
    let bin_samples = (histogram.bin_size * sample_rate as f32) as f64;

    for (k, target) in histogram.bins.iter().enumerate() {
        if target.is_silent() {
            continue;
        }
        let start = ((k as f64 * bin_samples).floor() as usize).min(len);
        let end = (((k + 1) as f64 * bin_samples).floor() as usize).min(len);
        if start >= end {
            continue;
        }

        let scales: [f32; NUM_BANDS] = std::array::from_fn(|band| {
            let local: f32 = noise[band][start..end].iter().map(|x| x * x).sum();
            (target.get(band) / (local + RESCALE_EPSILON)).sqrt()
        });

        for i in start..end {
            let value = mix.combine(std::array::from_fn(|band| noise[band][i] * scales[band]));
            buffer.set(i, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::EnergyBand;

    #[test]
    fn test_bin_energy_matches_target() {
        let mix = BandMix::new(1000, [0.0, 0.0, 0.0, 1.0]);
        let noise: [Vec<f32>; NUM_BANDS] =
            std::array::from_fn(|_| (0..100).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect());

        let mut histogram = EnergyHistogram::new(0.01, 10);
        histogram.bins[3] = EnergyBand::splat(2.0);

        let mut buffer = ResponseBuffer::new(100);
        shape_noise(&mut buffer, &noise, &histogram, &mix, 1000);

        let factor = mix.factor(3);
        let bin: f32 = buffer.samples()[30..40].iter().map(|x| x * x).sum();
        assert!((bin - 2.0 * factor * factor).abs() < 1e-4, "bin energy {bin}");
        assert!(buffer.samples()[..30].iter().all(|&s| s == 0.0));
        assert!(buffer.samples()[40..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_silent_noise_stays_finite() {
        let mix = BandMix::new(1000, [1.0; NUM_BANDS]);
        let noise: [Vec<f32>; NUM_BANDS] = std::array::from_fn(|_| vec![0.0; 50]);
        let mut histogram = EnergyHistogram::new(0.01, 5);
        histogram.bins[0] = EnergyBand::splat(1.0);

        let mut buffer = ResponseBuffer::new(50);
        shape_noise(&mut buffer, &noise, &histogram, &mix, 1000);
        assert!(buffer.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_histogram_past_buffer_is_clipped() {
        let mix = BandMix::new(1000, [1.0; NUM_BANDS]);
        let noise: [Vec<f32>; NUM_BANDS] = std::array::from_fn(|_| vec![1.0; 20]);
        let mut histogram = EnergyHistogram::new(0.01, 10);
        histogram.bins[9] = EnergyBand::splat(1.0);

        let mut buffer = ResponseBuffer::new(20);
        shape_noise(&mut buffer, &noise, &histogram, &mix, 1000);
        assert!(buffer.is_silent());
    }
}
