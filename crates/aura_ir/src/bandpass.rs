//! Brick-wall band splitting in the frequency domain.

use std::sync::Arc;

use aura_core::{band_index, NUM_BANDS};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Splits a fixed-length signal into the four energy bands.
///
/// Each FFT bin is assigned to the band that contains its frequency (the
/// mirrored frequency above Nyquist), so the bands sum back to the input
/// for everything up to the top band edge.
pub struct BandSplitter {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    len: usize,
    sample_rate: u32,
}

impl BandSplitter {
    pub fn new(len: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
            len,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frequency in Hz represented by FFT bin `bin`.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        let mirrored = bin.min(self.len - bin);
        mirrored as f32 * self.sample_rate as f32 / self.len as f32
    }

    /// Split `signal` into one signal per band.
    ///
    /// `signal` is zero-padded or truncated to the splitter length.
    pub fn split(&self, signal: &[f32]) -> [Vec<f32>; NUM_BANDS] {
        if self.len == 0 {
            return std::array::from_fn(|_| Vec::new());
        }

        let mut spectrum: Vec<Complex<f32>> = signal
            .iter()
            .take(self.len)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        spectrum.resize(self.len, Complex::new(0.0, 0.0));
        self.forward.process(&mut spectrum);

        let owners: Vec<Option<usize>> = (0..self.len)
            .map(|bin| band_index(self.bin_frequency(bin)))
            .collect();

        let scale = 1.0 / self.len as f32;
        std::array::from_fn(|band| {
            let mut masked: Vec<Complex<f32>> = spectrum
                .iter()
                .zip(&owners)
                .map(|(&value, &owner)| {
                    if owner == Some(band) {
                        value
                    } else {
                        Complex::new(0.0, 0.0)
                    }
                })
                .collect();
            self.inverse.process(&mut masked);
            masked.iter().map(|c| c.re * scale).collect()
        })
    }
}
