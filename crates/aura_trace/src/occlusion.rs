//! Occlusion estimate mapped to a per-source low-pass cutoff.
//!
//! Nine probe rays join the listener and the source, each end either at its
//! center or offset sideways. Offsets are perpendicular to the listener to
//! source direction in the horizontal plane and are shortened so they never
//! poke into nearby geometry. The number of blocked probes is a coarse proxy
//! for diffraction loss.

use aura_math::{Interval, Ray, Vec3};

use crate::dispatch::Substrate;
use crate::query::SceneQuery;
use crate::scene::TraceScene;

/// Probe rays per source.
pub const PROBE_COUNT: u32 = 9;

/// Cutoff with nothing in the way, in Hz.
pub const OPEN_CUTOFF_HZ: f32 = 22000.0;

/// Cutoff drop per blocked probe, in Hz.
pub const CUTOFF_STEP_HZ: f32 = 2200.0;

/// Distance kept from a surface hit by an offset probe.
const PROBE_CLEARANCE: f32 = 0.001;

/// Occlusion result of one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occlusion {
    pub slot: usize,
    pub occluded: u32,
    pub cutoff_hz: f32,
}

/// Low-pass cutoff for `occluded` blocked probes.
pub fn lowpass_cutoff(occluded: u32) -> f32 {
    OPEN_CUTOFF_HZ - CUTOFF_STEP_HZ * occluded.min(PROBE_COUNT) as f32
}

/// Sideways offset from `origin` along `direction`, stopped short of geometry.
fn probe_offset<Q: SceneQuery + ?Sized>(query: &Q, origin: Vec3, direction: Vec3, max_offset: f32) -> Vec3 {
    if max_offset <= 0.0 || direction == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let ray = Ray::new(origin, direction);
    let distance = match query.nearest_hit(&ray, Interval::new(0.0, max_offset)) {
        Some(hit) => (hit.t - PROBE_CLEARANCE).max(0.0),
        None => max_offset,
    };
    direction * distance
}

fn blocked<Q: SceneQuery + ?Sized>(query: &Q, from: Vec3, to: Vec3) -> bool {
    match Ray::towards(from, to) {
        Some((ray, distance)) => query.any_hit(&ray, Interval::new(0.0, distance)),
        None => false,
    }
}

/// Count how many of the nine probes between `listener` and `source` are blocked.
pub fn occluded_probes<Q: SceneQuery + ?Sized>(
    query: &Q,
    listener: Vec3,
    source: Vec3,
    listener_max_offset: f32,
    source_max_offset: f32,
) -> u32 {
    let side = (source - listener).cross(Vec3::Y).normalize_or_zero();

    let listener_left = probe_offset(query, listener, side, listener_max_offset);
    let listener_right = probe_offset(query, listener, -side, listener_max_offset);
    let source_left = probe_offset(query, source, side, source_max_offset);
    let source_right = probe_offset(query, source, -side, source_max_offset);

    let listener_ends = [listener, listener + listener_right, listener + listener_left];
    let source_ends = [source, source + source_right, source + source_left];

    let mut count = 0;
    for from in listener_ends {
        for to in source_ends {
            if blocked(query, from, to) {
                count += 1;
            }
        }
    }
    count
}

/// Occlusion of every source in the scene.
pub fn cast_occlusion(
    scene: &TraceScene,
    listener_max_offset: f32,
    source_max_offset: f32,
    substrate: Substrate,
) -> Vec<Occlusion> {
    substrate.map(scene.sources.len(), |i| {
        let source = &scene.sources[i];
        let occluded = occluded_probes(
            &scene.query,
            scene.listener,
            source.position(),
            listener_max_offset,
            source_max_offset,
        );
        Occlusion {
            slot: source.source.slot,
            occluded,
            cutoff_hz: lowpass_cutoff(occluded),
        }
    })
}
