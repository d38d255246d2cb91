//! Impulse response synthesis for the aura propagation engine.
//!
//! Arrivals produced by `aura_trace` become a mono time-domain response per
//! source, either by accreting a windowed impulse per arrival or by shaping
//! band-split Poisson noise with an energy histogram.

pub mod accretion;
pub mod bandpass;
pub mod gains;
pub mod poisson;
pub mod response;
pub mod shaping;
pub mod synth;
pub mod window;

pub use accretion::accrete;
pub use bandpass::BandSplitter;
pub use gains::{BandMix, BAND_WIDTHS_HZ};
pub use poisson::{event_rate, onset_time, poisson_train, MAX_EVENT_RATE};
pub use response::{downsample_to, ResponseBuffer};
pub use shaping::shape_noise;
pub use synth::Synthesizer;
pub use window::{hann, WINDOW_SIZE};
