//! Engine error types.

use aura_core::{CacheError, CapacityError, InitializationError};
use aura_trace::BvhError;
use thiserror::Error;

use crate::engine::EngineState;
use crate::sink::SinkError;

/// Errors returned by [`crate::PropagationEngine`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Init(#[from] InitializationError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("Reverb sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Cached BVH does not match the cached geometry: {0}")]
    Bvh(#[from] BvhError),

    #[error("Engine is {0:?}; sources need a ready engine")]
    NotReady(EngineState),

    #[error("Unknown source handle for slot {0}")]
    UnknownSource(usize),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
