//! Stochastic ray tracing from the listener.
//!
//! Rays leave the listener along a fixed golden-spiral direction set. At
//! every hit the ray loses the absorbed share of its energy. The scattered
//! share is "rained" straight to each source the hit point can see, and the
//! ray continues along the mirror direction bent towards a random diffuse
//! direction by the surface's mean scattering. Rays passing within a source's
//! capture radius after at least one reflection record an arrival too.
//!
//! Every ray seeds its own RNG from the frame and its index, so a ray's
//! path depends on nothing but the scene and those two numbers.

use std::f32::consts::PI;

use aura_core::{EnergyBand, EngineConfig, PathKind, RayArrival, NUM_BANDS};
use aura_math::{golden_spiral, Interval, Ray, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dispatch::{ArrivalBuffer, Substrate};
use crate::query::SceneQuery;
use crate::scatter::scatter;
use crate::scene::{TraceScene, TracedSource};

/// Relative air absorption per band, multiplied by the configured coefficient.
pub const AIR_BAND_SCALE: [f32; NUM_BANDS] = [0.0001, 0.0005, 0.003, 0.02];

/// Energy left per band after travelling `length` meters through air.
pub fn air_attenuation(coefficient: f32, length: f32) -> EnergyBand {
    EnergyBand::new(AIR_BAND_SCALE.map(|scale| (-coefficient * scale * length).exp()))
}

/// Something that happened to a traced ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceEvent {
    /// The ray hit a surface; `energy` is what it carries on afterwards.
    Bounce {
        depth: u32,
        triangle: usize,
        point: Vec3,
        energy: EnergyBand,
    },
    Arrival(RayArrival),
}

/// Tracing parameters taken from [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    pub max_depth: u32,
    pub air_absorption: f32,
    pub energy_threshold: f32,
    pub seed: u64,
    pub vector_scattering: bool,
    pub diffuse_rain: bool,
}

impl From<&EngineConfig> for TraceSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            air_absorption: config.air_absorption,
            energy_threshold: config.energy_threshold,
            seed: config.seed,
            vector_scattering: config.stages.vector_scattering,
            diffuse_rain: config.stages.diffuse_rain,
        }
    }
}

/// The listener's ray set.
#[derive(Debug, Clone)]
pub struct StochasticTracer {
    directions: Vec<Vec3>,
}

impl StochasticTracer {
    pub fn new(num_rays: usize) -> Self {
        Self {
            directions: golden_spiral(num_rays),
        }
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn ray_count(&self) -> usize {
        self.directions.len()
    }

    /// Trace ray `index` for `frame`, reporting bounces and arrivals to `on_event`.
    ///
    /// A ray starts with unit energy in every band; recorded arrivals are
    /// divided by the ray count so the whole set carries unit energy.
    pub fn trace_ray<F>(
        &self,
        scene: &TraceScene,
        settings: &TraceSettings,
        frame: u64,
        index: usize,
        mut on_event: F,
    ) where
        F: FnMut(TraceEvent),
    {
        let Some(&direction) = self.directions.get(index) else {
            return;
        };
        let ray_weight = 1.0 / self.directions.len() as f32;
        let mut rng = StdRng::seed_from_u64(ray_seed(settings.seed, frame, index as u64));

        let mut ray = Ray::new(scene.listener, direction);
        let mut ray_t = Interval::FORWARD;
        let mut energy = EnergyBand::splat(1.0);
        let mut travelled = 0.0;
        // Captures start after the first reflection
        let mut reflected = false;

        for depth in 0..settings.max_depth {
            let hit = scene.query.nearest_hit(&ray, ray_t);
            let segment = hit.map_or(f32::INFINITY, |h| h.t);

            if reflected {
                for source in scene.sources {
                    if let Some(along) = capture_distance(&ray, segment, source) {
                        let captured = energy * air_attenuation(settings.air_absorption, along);
                        emit(
                            &mut on_event,
                            RayArrival {
                                direction_id: index as u32,
                                source_id: source.id(),
                                energy: captured.scale(ray_weight),
                                distance: travelled + along,
                                kind: PathKind::Diffuse,
                            },
                        );
                    }
                }
            }

            let Some(hit) = hit else { break };
            let Some(material) = scene.material(hit.triangle) else {
                break;
            };

            travelled += hit.t;
            energy = energy * air_attenuation(settings.air_absorption, hit.t);
            energy = energy.attenuate(material.absorption);

            if settings.diffuse_rain {
                let diffuse = energy * EnergyBand::new(material.scattering);
                if !diffuse.is_silent() {
                    for source in scene.sources {
                        let Some((weight, distance)) = rain_weight(scene, hit.point, hit.normal, source) else {
                            continue;
                        };
                        let rained = diffuse.scale(weight)
                            * air_attenuation(settings.air_absorption, distance);
                        emit(
                            &mut on_event,
                            RayArrival {
                                direction_id: index as u32,
                                source_id: source.id(),
                                energy: rained.scale(ray_weight),
                                distance: travelled + distance,
                                kind: PathKind::Diffuse,
                            },
                        );
                    }
                }
                // The rained share leaves the ray
                energy = energy.attenuate(material.scattering);
            }

            on_event(TraceEvent::Bounce {
                depth,
                triangle: hit.triangle,
                point: hit.point,
                energy,
            });

            if energy.below(settings.energy_threshold) || energy.is_silent() {
                break;
            }

            let scattering = if settings.vector_scattering {
                material.mean_scattering()
            } else {
                0.0
            };
            ray = Ray::new(hit.point, scatter(ray.direction, hit.normal, scattering, &mut rng));
            ray_t = Interval::from_surface(f32::INFINITY);
            reflected = true;
        }
    }

    /// Trace every ray of `frame` into `buffer`.
    pub fn dispatch(
        &self,
        scene: &TraceScene,
        settings: &TraceSettings,
        frame: u64,
        substrate: Substrate,
        buffer: &ArrivalBuffer,
    ) {
        if scene.sources.is_empty() {
            return;
        }
        substrate.run(self.directions.len(), |i| {
            self.trace_ray(scene, settings, frame, i, |event| {
                if let TraceEvent::Arrival(arrival) = event {
                    buffer.push(arrival);
                }
            });
        });
    }
}

fn emit<F: FnMut(TraceEvent)>(on_event: &mut F, arrival: RayArrival) {
    if !arrival.energy.is_silent() {
        on_event(TraceEvent::Arrival(arrival));
    }
}

/// Distance along `ray` to the point closest to `source`, if that point is
/// inside the capture sphere and before the ray's next hit.
fn capture_distance(ray: &Ray, segment: f32, source: &TracedSource) -> Option<f32> {
    let to_center = source.position() - ray.origin;
    let along = to_center.dot(ray.direction);
    if along <= 0.0 || along > segment {
        return None;
    }
    let miss = (to_center - ray.direction * along).length();
    (miss <= source.source.radius).then_some(along)
}

/// Lambert-projected solid angle of `source` seen from a surface point,
/// with the distance to it. `None` if the source is behind the surface or
/// hidden.
fn rain_weight(scene: &TraceScene, point: Vec3, normal: Vec3, source: &TracedSource) -> Option<(f32, f32)> {
    let to_source = source.position() - point;
    let distance = to_source.length();
    if distance <= f32::EPSILON {
        return None;
    }
    let cos_theta = normal.dot(to_source) / distance;
    if cos_theta <= 0.0 || !scene.query.is_visible(point, source.position()) {
        return None;
    }

    let radius = source.source.radius;
    let solid_angle = if distance > radius {
        let ratio = radius / distance;
        2.0 * PI * (1.0 - (1.0 - ratio * ratio).sqrt())
    } else {
        2.0 * PI
    };
    Some(((cos_theta * solid_angle / PI).min(1.0), distance))
}

/// SplitMix64 over the seed, frame and ray index.
fn ray_seed(seed: u64, frame: u64, index: u64) -> u64 {
    let mut z = seed
        ^ frame.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
