//! First-order specular reflections from precomputed image sources.
//!
//! One kernel per (source, triangle) pair. A valid image yields an arrival
//! when the segment from the listener to the image crosses the reflecting
//! triangle and both legs of the folded path are unobstructed.

use aura_core::{EnergyBand, PathKind, RayArrival};
use aura_math::{Interval, Ray, EPSILON};

use crate::dispatch::{ArrivalBuffer, Substrate};
use crate::query::SceneQuery;
use crate::scene::TraceScene;
use crate::triangle::intersect;

/// Specular arrival via triangle `triangle` for the source at `source_index`.
pub fn image_source_arrival(
    scene: &TraceScene,
    source_index: usize,
    triangle: usize,
    energy_ratio: f32,
) -> Option<RayArrival> {
    let source = scene.sources.get(source_index)?;
    let image = source.images.get(triangle)?;
    let weight = image.weight();
    if weight <= 0.0 {
        return None;
    }
    let tri = scene.triangles.get(triangle)?;
    let material = scene.material(triangle)?;

    let (ray, distance) = Ray::towards(scene.listener, image.position)?;
    let hit = intersect(tri, &ray, Interval::new(0.0, distance))?;
    let reflection_point = ray.at(hit.t);

    if !scene.query.is_visible(scene.listener, reflection_point)
        || !scene.query.is_visible(reflection_point, source.position())
    {
        return None;
    }

    let energy = EnergyBand::splat(weight / (distance.max(EPSILON) * energy_ratio))
        .attenuate(material.absorption);
    if energy.is_silent() {
        return None;
    }

    Some(RayArrival {
        direction_id: triangle as u32,
        source_id: source.id(),
        energy,
        distance,
        kind: PathKind::Specular,
    })
}

/// Evaluate every (source, triangle) pair into `buffer`.
pub fn cast_image_sources(
    scene: &TraceScene,
    energy_ratio: f32,
    substrate: Substrate,
    buffer: &ArrivalBuffer,
) {
    let triangles = scene.triangles.len();
    if triangles == 0 {
        return;
    }
    substrate.run(scene.sources.len() * triangles, |i| {
        if let Some(arrival) = image_source_arrival(scene, i / triangles, i % triangles, energy_ratio) {
            buffer.push(arrival);
        }
    });
}
