//! Direct path: one visibility ray per source.

use aura_core::{EnergyBand, PathKind, RayArrival};
use aura_math::EPSILON;

use crate::dispatch::{ArrivalBuffer, Substrate};
use crate::query::SceneQuery;
use crate::scene::TraceScene;

/// Direct arrival from the source at `source_index`, if the listener can see it.
///
/// Energy is `1 / (distance * energy_ratio)` in every band.
pub fn direct_arrival(scene: &TraceScene, source_index: usize, energy_ratio: f32) -> Option<RayArrival> {
    let source = scene.sources.get(source_index)?;
    let position = source.position();

    if !scene.query.is_visible(scene.listener, position) {
        return None;
    }

    let distance = scene.listener.distance(position);
    Some(RayArrival {
        direction_id: 0,
        source_id: source.id(),
        energy: EnergyBand::splat(1.0 / (distance.max(EPSILON) * energy_ratio)),
        distance,
        kind: PathKind::Direct,
    })
}

/// Cast the direct ray of every source into `buffer`.
pub fn cast_direct(scene: &TraceScene, energy_ratio: f32, substrate: Substrate, buffer: &ArrivalBuffer) {
    substrate.run(scene.sources.len(), |i| {
        if let Some(arrival) = direct_arrival(scene, i, energy_ratio) {
            buffer.push(arrival);
        }
    });
}
