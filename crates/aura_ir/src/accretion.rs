//! Direct accretion: one windowed random-phase impulse per arrival.

use std::f32::consts::TAU;

use aura_core::RayArrival;
use rand::Rng;

use crate::gains::BandMix;
use crate::response::ResponseBuffer;

/// Add every arrival of `source_id` to `buffer`.
///
/// An arrival lands at sample `floor(arrival_time * sample_rate)` and spreads
/// over the window taps that follow, clipped at the end of the buffer. Its
/// amplitude is the band mix of `sqrt(energy)` with one random phase per
/// arrival. Returns the number of arrivals written.
pub fn accrete<R: Rng + ?Sized>(
    buffer: &mut ResponseBuffer,
    arrivals: &[RayArrival],
    source_id: u32,
    mix: &BandMix,
    window: &[f32],
    sample_rate: u32,
    rng: &mut R,
) -> usize {
    let mut written = 0;

    for arrival in arrivals.iter().filter(|a| a.source_id == source_id) {
        let position = (arrival.arrival_time() * sample_rate as f32).floor();
        if !(position >= 0.0) || position as usize >= buffer.len() {
            continue;
        }
        let start = position as usize;

        let amplitude = mix.combine(arrival.energy.bands().map(f32::sqrt));
        let phase = rng.gen_range(0.0..TAU).cos();
        let value = amplitude * phase;

        for (offset, tap) in window.iter().enumerate() {
            buffer.add(start + offset, value * tap);
        }
        written += 1;
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{hann, WINDOW_SIZE};
    use aura_core::{EnergyBand, PathKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arrival(source_id: u32, distance: f32) -> RayArrival {
        RayArrival {
            direction_id: 0,
            source_id,
            energy: EnergyBand::splat(0.25),
            distance,
            kind: PathKind::Direct,
        }
    }

    #[test]
    fn test_arrival_lands_on_its_sample() {
        let mix = BandMix::new(1000, [1.0; 4]);
        let window = hann(WINDOW_SIZE);
        let mut buffer = ResponseBuffer::new(1000);
        let mut rng = StdRng::seed_from_u64(1);

        // 34.3 m at 343 m/s and 1 kHz is sample 100
        let written = accrete(&mut buffer, &[arrival(0, 34.3)], 0, &mix, &window, 1000, &mut rng);
        assert_eq!(written, 1);

        let samples = buffer.samples();
        let first = samples.iter().position(|&s| s != 0.0).unwrap();
        let last = samples.iter().rposition(|&s| s != 0.0).unwrap();
        // End taps of the window are zero
        assert!(first >= 99 && first <= 101, "first = {first}");
        assert!(last < 100 + WINDOW_SIZE);
    }

    #[test]
    fn test_other_sources_and_late_arrivals_ignored() {
        let mix = BandMix::new(1000, [1.0; 4]);
        let window = hann(WINDOW_SIZE);
        let mut buffer = ResponseBuffer::new(100);
        let mut rng = StdRng::seed_from_u64(2);

        let arrivals = [arrival(1, 10.0), arrival(0, 343.0)];
        let written = accrete(&mut buffer, &arrivals, 0, &mix, &window, 1000, &mut rng);
        assert_eq!(written, 0);
        assert!(buffer.is_silent());
    }

    #[test]
    fn test_window_clipped_at_end() {
        let mix = BandMix::new(1000, [1.0; 4]);
        let window = vec![1.0; WINDOW_SIZE];
        let mut buffer = ResponseBuffer::new(100);
        let mut rng = StdRng::seed_from_u64(3);

        // Sample 95, window runs past the end
        accrete(&mut buffer, &[arrival(0, 32.7)], 0, &mix, &window, 1000, &mut rng);
        assert_eq!(buffer.len(), 100);
        let nonzero = buffer.samples().iter().filter(|&&s| s != 0.0).count();
        assert!(nonzero > 0 && nonzero <= 6);
    }

    #[test]
    fn test_amplitude_follows_energy() {
        let mix = BandMix::new(1000, [1.0; 4]);
        let window = vec![1.0];
        let mut rng = StdRng::seed_from_u64(4);

        let mut buffer = ResponseBuffer::new(10);
        accrete(&mut buffer, &[arrival(0, 0.0)], 0, &mix, &window, 1000, &mut rng);
        let expected = mix.combine([0.5; 4]);
        assert!(buffer.samples()[0].abs() <= expected + 1e-6);
    }
}
