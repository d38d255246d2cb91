//! Engine configuration.
//!
//! Values are checked once by [`EngineConfig::validate`] when the engine is
//! initialized; nothing re-validates them per tick.

use aura_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::band::NUM_BANDS;
use crate::error::ConfigError;

/// Longest impulse response, in seconds.
pub const MAX_RESPONSE_LENGTH: f32 = 10.0;

/// How arrivals are turned into a time-domain response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// Windowed random-phase impulses at each arrival time.
    #[default]
    Accretion,
    /// Band-passed Poisson noise shaped by an energy histogram.
    HistogramNoise,
}

/// Per-tick pipeline stages and tracing options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub direct: bool,
    pub image_sources: bool,
    pub ray_tracing: bool,
    pub occlusion: bool,
    /// Query the BVH; when false every query tests all triangles.
    pub use_bvh: bool,
    /// Blend reflected directions towards random ones by scattering.
    pub vector_scattering: bool,
    /// Send the diffuse share of each hit straight to visible sources.
    pub diffuse_rain: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            direct: true,
            image_sources: true,
            ray_tracing: true,
            occlusion: true,
            use_bvh: true,
            vector_scattering: true,
            diffuse_rain: true,
        }
    }
}

/// All tunables of the propagation engine and synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Ray tracing
    pub num_rays: u32,
    pub max_depth: u32,
    pub air_absorption: f32,
    pub energy_threshold: f32,
    pub seed: u64,

    // Direct and image sources
    pub direct_energy_ratio: f32,
    pub image_source_energy_ratio: f32,

    // Occlusion probes
    pub listener_probe_offset: f32,
    pub source_probe_offset: f32,

    /// Added to the listener position before tracing.
    pub listener_offset: Vec3,
    pub stages: StageToggles,

    // Synthesis
    pub sample_rate: u32,
    /// Response length in seconds.
    pub response_length: f32,
    /// Histogram bin width in seconds.
    pub bin_size: f32,
    pub band_weights: [f32; NUM_BANDS],
    pub synthesis: SynthesisMode,
    /// Room volume in cubic meters; the scene bounds are used when unset.
    pub room_volume: Option<f32>,

    // Scene
    pub max_sources: usize,
    pub source_radius: f32,
    pub bvh_max_depth: u32,
    pub mesh_quality: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_rays: 1024,
            max_depth: 1,
            air_absorption: 0.1,
            energy_threshold: 0.0001,
            seed: 0,
            direct_energy_ratio: 30.0,
            image_source_energy_ratio: 20.0,
            listener_probe_offset: 0.5,
            source_probe_offset: 0.5,
            listener_offset: Vec3::ZERO,
            stages: StageToggles::default(),
            sample_rate: 44100,
            response_length: 1.0,
            bin_size: 0.005,
            band_weights: [1.0; NUM_BANDS],
            synthesis: SynthesisMode::Accretion,
            room_volume: None,
            max_sources: 3,
            source_radius: 0.5,
            bvh_max_depth: 8,
            mesh_quality: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_rays(mut self, count: u32) -> Self {
        self.num_rays = count;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn air_absorption(mut self, coefficient: f32) -> Self {
        self.air_absorption = coefficient;
        self
    }

    pub fn energy_threshold(mut self, threshold: f32) -> Self {
        self.energy_threshold = threshold;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn direct_energy_ratio(mut self, ratio: f32) -> Self {
        self.direct_energy_ratio = ratio;
        self
    }

    pub fn image_source_energy_ratio(mut self, ratio: f32) -> Self {
        self.image_source_energy_ratio = ratio;
        self
    }

    pub fn probe_offsets(mut self, listener: f32, source: f32) -> Self {
        self.listener_probe_offset = listener;
        self.source_probe_offset = source;
        self
    }

    pub fn listener_offset(mut self, offset: Vec3) -> Self {
        self.listener_offset = offset;
        self
    }

    pub fn stages(mut self, stages: StageToggles) -> Self {
        self.stages = stages;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn response_length(mut self, seconds: f32) -> Self {
        self.response_length = seconds;
        self
    }

    pub fn bin_size(mut self, seconds: f32) -> Self {
        self.bin_size = seconds;
        self
    }

    pub fn band_weights(mut self, weights: [f32; NUM_BANDS]) -> Self {
        self.band_weights = weights;
        self
    }

    pub fn synthesis(mut self, mode: SynthesisMode) -> Self {
        self.synthesis = mode;
        self
    }

    pub fn room_volume(mut self, volume: f32) -> Self {
        self.room_volume = Some(volume);
        self
    }

    pub fn max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    pub fn source_radius(mut self, radius: f32) -> Self {
        self.source_radius = radius;
        self
    }

    pub fn bvh_max_depth(mut self, depth: u32) -> Self {
        self.bvh_max_depth = depth;
        self
    }

    pub fn mesh_quality(mut self, quality: f32) -> Self {
        self.mesh_quality = quality;
        self
    }

    /// Number of samples in one response.
    pub fn response_samples(&self) -> usize {
        (self.response_length * self.sample_rate as f32).round() as usize
    }

    /// Number of histogram bins covering one response.
    pub fn histogram_bins(&self) -> usize {
        ((self.response_length / self.bin_size).round() as usize).max(1)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("num_rays", self.num_rays as f64, 32.0, 32768.0)?;
        in_range("max_depth", self.max_depth as f64, 1.0, 128.0)?;
        in_range("air_absorption", self.air_absorption as f64, 0.0, 2.0)?;
        in_range("energy_threshold", self.energy_threshold as f64, 0.0, 0.001)?;
        in_range("direct_energy_ratio", self.direct_energy_ratio as f64, 1.0, 50.0)?;
        in_range(
            "image_source_energy_ratio",
            self.image_source_energy_ratio as f64,
            1.0,
            50.0,
        )?;
        in_range("listener_probe_offset", self.listener_probe_offset as f64, 0.0, 5.0)?;
        in_range("source_probe_offset", self.source_probe_offset as f64, 0.0, 5.0)?;
        in_range("sample_rate", self.sample_rate as f64, 1.0, 48000.0)?;
        positive("response_length", self.response_length as f64)?;
        in_range(
            "response_length",
            self.response_length as f64,
            0.0,
            MAX_RESPONSE_LENGTH as f64,
        )?;
        positive("bin_size", self.bin_size as f64)?;
        in_range("bin_size", self.bin_size as f64, 0.0, self.response_length as f64)?;
        for weight in self.band_weights {
            in_range("band_weights", weight as f64, 0.0, 1.0)?;
        }
        if let Some(volume) = self.room_volume {
            positive("room_volume", volume as f64)?;
        }
        in_range("max_sources", self.max_sources as f64, 1.0, 32.0)?;
        in_range("source_radius", self.source_radius as f64, 0.0, 5.0)?;
        in_range("bvh_max_depth", self.bvh_max_depth as f64, 0.0, 32.0)?;
        in_range("mesh_quality", self.mesh_quality as f64, 0.0, 1.0)?;
        Ok(())
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.response_samples(), 44100);
        assert_eq!(config.histogram_bins(), 200);
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::new()
            .num_rays(4096)
            .max_depth(16)
            .sample_rate(48000)
            .room_volume(120.0)
            .synthesis(SynthesisMode::HistogramNoise);

        assert_eq!(config.num_rays, 4096);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.room_volume, Some(120.0));
        assert_eq!(config.synthesis, SynthesisMode::HistogramNoise);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_fields_name_themselves() {
        let err = EngineConfig::new().num_rays(16).validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "num_rays", .. }));

        let err = EngineConfig::new().max_depth(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "max_depth", .. }));

        let err = EngineConfig::new().sample_rate(96000).validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "sample_rate", .. }));

        let err = EngineConfig::new().bin_size(0.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "bin_size", .. }));

        let err = EngineConfig::new()
            .band_weights([1.0, 1.5, 1.0, 1.0])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("band_weights"));
    }

    #[test]
    fn test_response_length_is_bounded() {
        let err = EngineConfig::new().response_length(60.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "response_length", .. }));
        assert!(EngineConfig::new()
            .response_length(MAX_RESPONSE_LENGTH)
            .validate()
            .is_ok());

        let err = EngineConfig::new()
            .response_length(0.5)
            .bin_size(0.75)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "bin_size", .. }));
    }

    #[test]
    fn test_nan_is_rejected() {
        let err = EngineConfig::new().air_absorption(f32::NAN).validate();
        assert!(err.is_err());
    }

    #[test]
    fn test_json_partial_config() {
        let json = r#"{ "num_rays": 2048, "synthesis": "histogram_noise", "stages": { "occlusion": false } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.num_rays, 2048);
        assert_eq!(config.synthesis, SynthesisMode::HistogramNoise);
        assert!(!config.stages.occlusion);
        assert!(config.stages.direct);
        assert_eq!(config.max_sources, 3);
    }
}
