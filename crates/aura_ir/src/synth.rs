//! Turns the arrivals of one tick into per-source responses.

use aura_core::{EngineConfig, EnergyHistogram, RayArrival, SynthesisMode, NUM_BANDS};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::accretion::accrete;
use crate::bandpass::BandSplitter;
use crate::gains::BandMix;
use crate::poisson::poisson_train;
use crate::response::ResponseBuffer;
use crate::shaping::shape_noise;
use crate::window::{hann, WINDOW_SIZE};

// Keeps the synthesis stream apart from the tracer stream for the same seed
const SYNTH_SEED_SALT: u64 = 0x5eed_a0d1_0000_0001;

/// Band-split Poisson noise for one room volume.
struct NoiseBands {
    volume: f32,
    bands: [Vec<f32>; NUM_BANDS],
}

/// Impulse response synthesizer.
///
/// Holds everything derived from the configuration so a tick only pays for
/// the arrivals it writes. The noise bands of histogram mode are generated on
/// first use and kept until the room volume changes.
pub struct Synthesizer {
    mode: SynthesisMode,
    sample_rate: u32,
    response_len: usize,
    bin_size: f32,
    histogram_bins: usize,
    mix: BandMix,
    window: Vec<f32>,
    rng: StdRng,
    noise: Option<NoiseBands>,
}

impl Synthesizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mode: config.synthesis,
            sample_rate: config.sample_rate,
            response_len: config.response_samples(),
            bin_size: config.bin_size,
            histogram_bins: config.histogram_bins(),
            mix: BandMix::new(config.sample_rate, config.band_weights),
            window: hann(WINDOW_SIZE),
            rng: StdRng::seed_from_u64(config.seed ^ SYNTH_SEED_SALT),
            noise: None,
        }
    }

    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Response length in samples.
    pub fn response_len(&self) -> usize {
        self.response_len
    }

    pub fn mix(&self) -> &BandMix {
        &self.mix
    }

    /// A zeroed buffer of the response length.
    pub fn buffer(&self) -> ResponseBuffer {
        ResponseBuffer::new(self.response_len)
    }

    /// Replace the contents of `buffer` with the response of `source_id`.
    ///
    /// `room_volume` is only read in histogram mode. Returns the number of
    /// arrivals that contributed.
    pub fn synthesize(
        &mut self,
        buffer: &mut ResponseBuffer,
        arrivals: &[RayArrival],
        source_id: u32,
        room_volume: f32,
    ) -> usize {
        buffer.clear();
        match self.mode {
            SynthesisMode::Accretion => accrete(
                buffer,
                arrivals,
                source_id,
                &self.mix,
                &self.window,
                self.sample_rate,
                &mut self.rng,
            ),
            SynthesisMode::HistogramNoise => {
                self.shape(buffer, arrivals, source_id, room_volume)
            }
        }
    }

    fn shape(
        &mut self,
        buffer: &mut ResponseBuffer,
        arrivals: &[RayArrival],
        source_id: u32,
        room_volume: f32,
    ) -> usize {
        let (histogram, binned) =
            EnergyHistogram::from_arrivals(arrivals, source_id, self.bin_size, self.histogram_bins);
        if histogram.is_silent() {
            return binned;
        }

        self.ensure_noise(room_volume);
        if let Some(noise) = &self.noise {
            shape_noise(buffer, &noise.bands, &histogram, &self.mix, self.sample_rate);
        }
        binned
    }

    fn ensure_noise(&mut self, volume: f32) {
        if self.noise.as_ref().is_some_and(|n| n.volume == volume) {
            return;
        }

        let train = poisson_train(volume as f64, self.sample_rate, self.response_len, &mut self.rng);
        let clicks = train.iter().filter(|&&s| s != 0.0).count();
        let bands = BandSplitter::new(self.response_len, self.sample_rate).split(&train);
        debug!("Generated noise bands for {:.1} m^3 ({} clicks)", volume, clicks);

        self.noise = Some(NoiseBands { volume, bands });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::{EnergyBand, PathKind};

    fn arrival(source_id: u32, distance: f32) -> RayArrival {
        RayArrival {
            direction_id: 0,
            source_id,
            energy: EnergyBand::splat(0.01),
            distance,
            kind: PathKind::Specular,
        }
    }

    fn config(mode: SynthesisMode) -> EngineConfig {
        EngineConfig::new()
            .sample_rate(8000)
            .response_length(0.5)
            .synthesis(mode)
            .seed(7)
    }

    #[test]
    fn test_no_arrivals_is_silent() {
        let mut synth = Synthesizer::new(&config(SynthesisMode::Accretion));
        let mut buffer = synth.buffer();
        assert_eq!(buffer.len(), 4000);

        assert_eq!(synth.synthesize(&mut buffer, &[], 0, 100.0), 0);
        assert!(buffer.is_silent());
    }

    #[test]
    fn test_accretion_resets_previous_tick() {
        let mut synth = Synthesizer::new(&config(SynthesisMode::Accretion));
        let mut buffer = synth.buffer();

        synth.synthesize(&mut buffer, &[arrival(0, 10.0)], 0, 100.0);
        assert!(!buffer.is_silent());

        synth.synthesize(&mut buffer, &[arrival(1, 10.0)], 0, 100.0);
        assert!(buffer.is_silent());
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_histogram_mode_fills_arrival_bins() {
        let mut synth = Synthesizer::new(&config(SynthesisMode::HistogramNoise));
        let mut buffer = synth.buffer();

        // Arrivals spread over 50..150 ms of a 100 m^3 room
        let arrivals: Vec<RayArrival> = (0..200)
            .map(|i| arrival(0, 17.32 + i as f32 * 0.17))
            .collect();
        let binned = synth.synthesize(&mut buffer, &arrivals, 0, 100.0);
        assert_eq!(binned, 200);
        assert!(!buffer.is_silent());

        // Nothing before the first occupied bin at 50 ms
        assert!(buffer.samples()[..400].iter().all(|&s| s == 0.0));
        assert!(buffer.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_histogram_noise_reused_for_same_volume() {
        let mut synth = Synthesizer::new(&config(SynthesisMode::HistogramNoise));
        let mut buffer = synth.buffer();
        let arrivals = [arrival(0, 30.0), arrival(0, 60.0)];

        synth.synthesize(&mut buffer, &arrivals, 0, 100.0);
        let first = buffer.samples().to_vec();
        synth.synthesize(&mut buffer, &arrivals, 0, 100.0);
        assert_eq!(first, buffer.samples());
    }
}
