//! Window shapes used to smear arrivals over a few samples.

use std::f32::consts::PI;

/// Taps of the arrival window.
pub const WINDOW_SIZE: usize = 32;

/// Symmetric Hann window, `0.5 * (1 - cos(2*pi*n / (size - 1)))`.
///
/// Both end taps are zero and the window peaks at the center.
pub fn hann(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denominator = (size - 1) as f32;
    (0..size)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / denominator).cos()))
        .collect()
}
