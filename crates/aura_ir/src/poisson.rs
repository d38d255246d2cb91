//! Poisson click train with the reflection density of a room.

use std::f64::consts::{LN_2, PI};

use aura_core::SPEED_OF_SOUND;
use rand::Rng;

/// Cap on the click rate in events per second.
pub const MAX_EVENT_RATE: f64 = 1e4;

/// Time of the first click, `cbrt(2 * V * ln 2 / (4 * pi * c^3))`.
pub fn onset_time(volume: f64) -> f64 {
    let c = SPEED_OF_SOUND as f64;
    (2.0 * volume * LN_2 / (4.0 * PI * c * c * c)).cbrt()
}

/// Click rate at time `t`, `min(1e4, 4 * pi * c^2 * t / (2 * V))`.
pub fn event_rate(t: f64, volume: f64) -> f64 {
    let c = SPEED_OF_SOUND as f64;
    (4.0 * PI * c * c * t / (2.0 * volume)).min(MAX_EVENT_RATE)
}

/// `len` samples of +1/-1 clicks at exponentially distributed intervals.
///
/// A click lands on the nearest sample; its sign is +1 when that sample is
/// before the exact click time and -1 otherwise.
pub fn poisson_train<R: Rng + ?Sized>(volume: f64, sample_rate: u32, len: usize, rng: &mut R) -> Vec<f32> {
    let mut train = vec![0.0; len];
    if len == 0 || !(volume > 0.0) {
        return train;
    }

    let fs = sample_rate as f64;
    let duration = len as f64 / fs;
    let mut t = onset_time(volume);

    while t < duration {
        let exact = t * fs;
        let index = exact.round();
        if (index as usize) < len {
            train[index as usize] = if index - exact < 0.0 { 1.0 } else { -1.0 };
        }

        let rate = event_rate(t, volume);
        // 1 - [0, 1) keeps the log finite
        let u: f64 = 1.0 - rng.gen::<f64>();
        t += -u.ln() / rate;
    }

    train
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_onset_grows_with_volume() {
        let small = onset_time(50.0);
        let large = onset_time(5000.0);
        assert!(small > 0.0 && small < large);
        // Doubling the volume scales the onset by cbrt(2)
        assert!((onset_time(100.0) / small - 2f64.cbrt()).abs() < 1e-9);
    }

    #[test]
    fn test_event_rate_is_capped() {
        assert!(event_rate(0.001, 200.0) < MAX_EVENT_RATE);
        assert_eq!(event_rate(10.0, 200.0), MAX_EVENT_RATE);
    }

    #[test]
    fn test_train_has_unit_clicks_after_onset() {
        let mut rng = StdRng::seed_from_u64(9);
        let train = poisson_train(200.0, 44100, 44100, &mut rng);

        let onset = (onset_time(200.0) * 44100.0).round() as usize;
        assert!(train[..onset].iter().all(|&s| s == 0.0));
        assert!(train.iter().all(|&s| s == 0.0 || s == 1.0 || s == -1.0));

        // Density rises over time
        let early = train[..4410].iter().filter(|&&s| s != 0.0).count();
        let late = train[39690..].iter().filter(|&&s| s != 0.0).count();
        assert!(late > early);
        assert!(late > 500);
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(poisson_train(0.0, 44100, 100, &mut rng).iter().all(|&s| s == 0.0));
        assert!(poisson_train(100.0, 44100, 0, &mut rng).is_empty());
    }
}
