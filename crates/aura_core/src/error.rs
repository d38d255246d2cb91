//! Error types shared by the Aura crates.

use thiserror::Error;

/// A configuration value outside its allowed range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

/// A required resource is missing or inconsistent at initialization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitializationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No scene geometry was provided")]
    MissingGeometry,

    #[error("No materials were provided")]
    MissingMaterials,

    #[error("No output channels are available for sources")]
    MissingChannels,

    #[error("Triangle {triangle} references material {material} but only {available} exist")]
    UnknownMaterial {
        triangle: usize,
        material: u32,
        available: usize,
    },
}

/// A fixed-size pool or buffer cannot take another entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("All {capacity} source slots are in use")]
    SlotsExhausted { capacity: usize },

    #[error("{what} needs {requested} entries but holds at most {capacity}")]
    BufferFull {
        what: &'static str,
        requested: usize,
        capacity: usize,
    },
}

/// Reading or writing a binary cache failed.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Negative record count {count} in {what} cache")]
    NegativeCount { what: &'static str, count: i32 },

    #[error("Invalid cache contents: {0}")]
    Invalid(String),
}
