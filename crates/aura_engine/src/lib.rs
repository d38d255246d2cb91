//! Aura Engine - real-time acoustic propagation driving a convolution reverb.
//!
//! [`PropagationEngine`] owns the scene index, the live sources and the
//! listener. Every [`tick`](PropagationEngine::tick) runs the propagation
//! stages from `aura_trace`, synthesizes one impulse response per source with
//! `aura_ir` and hands the result to a [`ReverbSink`].
//!
//! # Example
//!
//! ```ignore
//! use aura_engine::{MemorySink, PropagationEngine};
//!
//! let mut engine = PropagationEngine::new(config, Some(MemorySink::new(3)));
//! engine.reload_scene(Some(geometry), materials)?;
//! let source = engine.add_source(Vec3::new(0.0, 5.0, 0.0))?;
//! let report = engine.tick(1.0 / 60.0)?;
//! ```

pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod report;
pub mod sink;

pub use engine::{EngineState, PropagationEngine};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus};
pub use registry::{SourceHandle, SourceRegistry};
pub use report::TickReport;
pub use sink::{ChannelState, MemorySink, ReverbSink, SinkError};
