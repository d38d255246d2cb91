//! Aura Trace - spatial index and acoustic propagation stages.
//!
//! This crate provides:
//!
//! - **BVH**: build, query, validate and cache the scene hierarchy
//! - **Queries**: the `SceneQuery` trait with BVH and brute-force backends
//! - **Stages**: direct path, first-order image sources, stochastic ray
//!   tracing and occlusion probes
//! - **Dispatch**: the parallel kernel runner and the shared arrival buffer
//!
//! All stages read an immutable [`TraceScene`] and append to an
//! [`ArrivalBuffer`]; none of them keep state between ticks.

pub mod bvh;
pub mod bvh_cache;
pub mod direct;
pub mod dispatch;
pub mod image_source;
pub mod index;
pub mod occlusion;
pub mod query;
pub mod scatter;
pub mod scene;
pub mod tracer;
pub mod triangle;

// Re-export commonly used types
pub use bvh::{Bvh, BvhError, BvhNode, BvhStats};
pub use bvh_cache::{load_bvh, read_bvh, save_bvh, write_bvh};
pub use direct::{cast_direct, direct_arrival};
pub use dispatch::{ArrivalBuffer, Substrate};
pub use image_source::{cast_image_sources, image_source_arrival};
pub use index::SpatialIndex;
pub use occlusion::{cast_occlusion, lowpass_cutoff, occluded_probes, Occlusion, OPEN_CUTOFF_HZ};
pub use query::{Hit, LinearScene, SceneQuery};
pub use scene::{Backend, TraceScene, TracedSource};
pub use tracer::{air_attenuation, StochasticTracer, TraceEvent, TraceSettings};

/// Largest arrival buffer ever allocated.
pub const MAX_ARRIVALS: usize = 1 << 20;

/// Arrival slots needed for one tick. Each ray may rain on every source at
/// each of its `max_depth` bounces and be captured by every source on each
/// of the `max_depth - 1` segments after a reflection. Add one image-source
/// arrival per (source, triangle) and one direct arrival per source.
pub fn arrival_capacity(num_rays: usize, max_depth: usize, sources: usize, triangles: usize) -> usize {
    let per_ray = max_depth.saturating_mul(2).saturating_sub(1);
    let traced = num_rays
        .saturating_mul(per_ray)
        .saturating_mul(sources.max(1));
    traced
        .saturating_add(sources.saturating_mul(triangles))
        .saturating_add(sources)
        .min(MAX_ARRIVALS)
}
