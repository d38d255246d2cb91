//! The propagation engine: owns the scene and runs one pipeline per tick.

use std::path::Path;
use std::sync::Arc;

use aura_core::{
    load_geometry, save_geometry, CapacityError, EngineConfig, Geometry, InitializationError,
    MaterialLibrary, MeshRange, RayArrival,
};
use aura_ir::{ResponseBuffer, Synthesizer};
use aura_math::Vec3;
use aura_trace::{
    arrival_capacity, cast_direct, cast_image_sources, cast_occlusion, load_bvh, save_bvh,
    ArrivalBuffer, SpatialIndex, StochasticTracer, Substrate, TraceScene, TraceSettings,
    MAX_ARRIVALS, OPEN_CUTOFF_HZ,
};
use log::{debug, error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus};
use crate::registry::{SourceHandle, SourceRegistry};
use crate::report::TickReport;
use crate::sink::ReverbSink;

/// Wet level restored when the simulation is re-enabled.
const FULL_WET_PERCENT: f32 = 100.0;

/// How far initialization got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Configuration, geometry or materials are missing or invalid; ticks do nothing.
    Uninitialized,
    /// The scene index exists but there are no output channels, so no sources.
    GeometryOnly,
    Ready,
}

/// Real-time acoustic propagation for one listener and a pool of sources.
///
/// Each [`tick`](Self::tick) casts rays, image sources, direct paths and
/// occlusion probes against the frozen scene, synthesizes one impulse response
/// per source and hands it to the sink. Nothing carries over between ticks
/// except the frame counter.
pub struct PropagationEngine<S: ReverbSink> {
    config: EngineConfig,
    state: EngineState,
    init_error: Option<InitializationError>,

    index: Option<Arc<SpatialIndex>>,
    meshes: Vec<MeshRange>,
    materials: MaterialLibrary,

    sources: SourceRegistry,
    listener: Vec3,

    tracer: StochasticTracer,
    settings: TraceSettings,
    substrate: Substrate,
    arrivals: ArrivalBuffer,
    collected: Vec<RayArrival>,

    synth: Synthesizer,
    responses: Vec<ResponseBuffer>,
    cutoffs: Vec<f32>,
    simulation_enabled: bool,

    sink: Option<S>,
    events: EventBus,
    frame: u64,
    elapsed: f64,
}

impl<S: ReverbSink> PropagationEngine<S> {
    /// Create an engine with no scene.
    ///
    /// The configuration is validated here; an invalid one keeps the engine
    /// uninitialized. Without a sink (or with a sink that has no channels)
    /// the engine can at most reach [`EngineState::GeometryOnly`].
    pub fn new(config: EngineConfig, sink: Option<S>) -> Self {
        let channels = sink.as_ref().map_or(0, |s| s.channel_count());
        // Nothing is sized from a config that failed validation
        let (init_error, rays, slots, synth) = match config.validate() {
            Ok(()) => (
                None,
                config.num_rays as usize,
                config.max_sources.min(channels),
                Synthesizer::new(&config),
            ),
            Err(err) => (
                Some(InitializationError::from(err)),
                0,
                0,
                Synthesizer::new(&EngineConfig::default()),
            ),
        };

        let mut engine = Self {
            state: EngineState::Uninitialized,
            init_error: None,
            index: None,
            meshes: Vec::new(),
            materials: MaterialLibrary::new(),
            sources: SourceRegistry::new(slots, config.source_radius),
            listener: Vec3::ZERO,
            tracer: StochasticTracer::new(rays),
            settings: TraceSettings::from(&config),
            substrate: Substrate::default(),
            arrivals: ArrivalBuffer::with_capacity(0),
            collected: Vec::new(),
            responses: (0..slots).map(|_| synth.buffer()).collect(),
            synth,
            cutoffs: vec![OPEN_CUTOFF_HZ; slots],
            simulation_enabled: true,
            sink,
            events: EventBus::new(),
            frame: 0,
            elapsed: 0.0,
            config,
        };

        if let Some(err) = init_error {
            engine.report_init_error(err);
        }
        engine
    }

    /// Create an engine and restore its scene from baked caches.
    pub fn from_cache(
        config: EngineConfig,
        sink: Option<S>,
        geometry_path: impl AsRef<Path>,
        bvh_path: impl AsRef<Path>,
        materials: MaterialLibrary,
    ) -> EngineResult<Self> {
        let mut engine = Self::new(config, sink);
        engine.restore_scene(geometry_path, bvh_path, materials)?;
        Ok(engine)
    }

    /// Build the spatial index for `geometry` and make it the scene.
    ///
    /// Live sources keep their slots; their image sources are recomputed
    /// against the new triangles.
    pub fn reload_scene(
        &mut self,
        geometry: Option<Geometry>,
        materials: MaterialLibrary,
    ) -> EngineResult<EngineState> {
        self.check_config()?;
        let geometry = match geometry {
            Some(geometry) => geometry,
            None => return Err(self.fail(InitializationError::MissingGeometry)),
        };
        if let Err(err) = geometry.check_materials(&materials) {
            return Err(self.fail(err));
        }

        let Geometry { triangles, meshes } = geometry;
        let index = SpatialIndex::build(triangles, self.config.bvh_max_depth);
        Ok(self.install(index, meshes, materials))
    }

    /// Replace the scene with a baked geometry cache and BVH cache.
    pub fn restore_scene(
        &mut self,
        geometry_path: impl AsRef<Path>,
        bvh_path: impl AsRef<Path>,
        materials: MaterialLibrary,
    ) -> EngineResult<EngineState> {
        self.check_config()?;
        let geometry = load_geometry(geometry_path)?;
        let bvh = load_bvh(bvh_path)?;
        if let Err(err) = geometry.check_materials(&materials) {
            return Err(self.fail(err));
        }

        let Geometry { triangles, meshes } = geometry;
        let index = SpatialIndex::from_parts(triangles, bvh)?;
        Ok(self.install(index, meshes, materials))
    }

    /// Write the current scene to a geometry cache and a BVH cache.
    ///
    /// Triangles are written in BVH order so the pair restores without a rebuild.
    pub fn bake(&self, geometry_path: impl AsRef<Path>, bvh_path: impl AsRef<Path>) -> EngineResult<()> {
        let Some(index) = &self.index else {
            return Err(EngineError::NotReady(self.state));
        };
        let geometry = Geometry::new(index.triangles().to_vec(), self.meshes.clone());
        save_geometry(geometry_path, &geometry)?;
        save_bvh(bvh_path, index.bvh())?;
        Ok(())
    }

    fn check_config(&mut self) -> EngineResult<()> {
        match self.config.validate() {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn install(&mut self, index: SpatialIndex, meshes: Vec<MeshRange>, materials: MaterialLibrary) -> EngineState {
        let triangles = index.triangle_count();
        self.sources.rebuild_images(index.triangles());

        match index.stats() {
            Ok(stats) => info!(
                "Scene index ready: {} triangles, {} BVH nodes ({} leaves, depth {})",
                triangles, stats.nodes, stats.leaves, stats.depth
            ),
            Err(err) => warn!("Scene index built with an inconsistent BVH: {}", err),
        }

        self.index = Some(Arc::new(index));
        self.meshes = meshes;
        self.materials = materials;
        self.init_error = None;

        self.state = if self.sources.capacity() > 0 {
            EngineState::Ready
        } else {
            self.report_init_error(InitializationError::MissingChannels);
            EngineState::GeometryOnly
        };

        self.events.emit(EngineEvent::Initialized {
            triangles,
            ready: self.state == EngineState::Ready,
        });
        self.state
    }

    /// Record an initialization failure and drop back to uninitialized.
    fn fail(&mut self, err: InitializationError) -> EngineError {
        self.report_init_error(err.clone());
        self.state = EngineState::Uninitialized;
        self.index = None;
        EngineError::Init(err)
    }

    fn report_init_error(&mut self, err: InitializationError) {
        if self.init_error.as_ref() != Some(&err) {
            error!("{}", err);
        }
        self.init_error = Some(err);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The initialization failure that keeps the engine from being ready, if any.
    pub fn init_error(&self) -> Option<&InitializationError> {
        self.init_error.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> Option<&SpatialIndex> {
        self.index.as_deref()
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.sink.as_mut()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.events.subscribe(observer);
    }

    pub fn substrate(&self) -> Substrate {
        self.substrate
    }

    pub fn set_substrate(&mut self, substrate: Substrate) {
        self.substrate = substrate;
    }

    /// Ticks completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of every `dt` passed to `tick`, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Arrivals collected by the last tick, ordered by source.
    pub fn arrivals(&self) -> &[RayArrival] {
        &self.collected
    }

    /// Response of `slot` as synthesized by the last tick.
    pub fn response(&self, slot: usize) -> Option<&ResponseBuffer> {
        self.responses.get(slot)
    }

    /// Room volume used for histogram synthesis, in cubic meters.
    pub fn room_volume(&self) -> f32 {
        match (self.config.room_volume, &self.index) {
            (Some(volume), _) => volume,
            (None, Some(index)) => index.bounds().volume(),
            (None, None) => 0.0,
        }
    }

    /// Register a source at `position` on the smallest free slot.
    pub fn add_source(&mut self, position: Vec3) -> EngineResult<SourceHandle> {
        let Some(index) = self.index.as_ref().filter(|_| self.state == EngineState::Ready) else {
            return Err(EngineError::NotReady(self.state));
        };

        let sources = self.sources.len() + 1;
        let image_arrivals = sources.saturating_mul(index.triangle_count()) + sources;
        if image_arrivals > MAX_ARRIVALS {
            return Err(CapacityError::BufferFull {
                what: "image-source arrivals",
                requested: image_arrivals,
                capacity: MAX_ARRIVALS,
            }
            .into());
        }

        let handle = self.sources.add(position, index.triangles())?;
        let slot = handle.slot();
        self.cutoffs[slot] = OPEN_CUTOFF_HZ;
        self.responses[slot].clear();

        info!("Source added on slot {} at {}", slot, position);
        self.events.emit(EngineEvent::SourceAdded { slot, position });
        Ok(handle)
    }

    /// Remove a source and free its slot.
    pub fn remove_source(&mut self, handle: SourceHandle) -> EngineResult<()> {
        if !self.sources.remove(handle) {
            return Err(EngineError::UnknownSource(handle.slot()));
        }
        let slot = handle.slot();
        self.cutoffs[slot] = OPEN_CUTOFF_HZ;
        self.responses[slot].clear();

        info!("Source removed from slot {}", slot);
        self.events.emit(EngineEvent::SourceRemoved { slot });
        Ok(())
    }

    /// Move a source; its image sources are recomputed immediately.
    pub fn move_source(&mut self, handle: SourceHandle, position: Vec3) -> EngineResult<()> {
        let Some(index) = &self.index else {
            return Err(EngineError::NotReady(self.state));
        };
        if !self.sources.relocate(handle, position, index.triangles()) {
            return Err(EngineError::UnknownSource(handle.slot()));
        }
        Ok(())
    }

    /// Listener position before `listener_offset` is applied.
    pub fn listener(&self) -> Vec3 {
        self.listener
    }

    pub fn set_listener(&mut self, position: Vec3) {
        if position == self.listener {
            return;
        }
        self.listener = position;
        self.events.emit(EngineEvent::ListenerMoved { position });
    }

    pub fn simulation_enabled(&self) -> bool {
        self.simulation_enabled
    }

    /// Last occlusion cutoff computed for `slot`.
    pub fn cutoff(&self, slot: usize) -> Option<f32> {
        self.cutoffs.get(slot).copied()
    }

    /// Bypass or restore the reverb on every channel.
    ///
    /// Disabled channels run fully dry with the low-pass open; occlusion
    /// cutoffs keep being computed but are only sent once re-enabled.
    pub fn set_simulation_enabled(&mut self, enabled: bool) {
        if enabled == self.simulation_enabled {
            return;
        }
        self.simulation_enabled = enabled;

        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        for (slot, &cached) in self.cutoffs.iter().enumerate() {
            let (wet, cutoff) = if enabled {
                (FULL_WET_PERCENT, cached)
            } else {
                (0.0, OPEN_CUTOFF_HZ)
            };
            if let Err(err) = sink.set_wet_mix(slot, wet) {
                warn!("Sink rejected wet mix for slot {}: {}", slot, err);
            }
            if let Err(err) = sink.set_lowpass_cutoff(slot, cutoff) {
                warn!("Sink rejected low-pass for slot {}: {}", slot, err);
            }
        }
        info!("Simulation {}", if enabled { "enabled" } else { "bypassed" });
    }

    /// Run one propagation pass and upload the resulting responses.
    ///
    /// Does nothing unless the engine is ready. Upload failures abort the
    /// tick and are returned; rejected low-pass updates are only logged.
    pub fn tick(&mut self, dt: f32) -> EngineResult<TickReport> {
        self.elapsed += dt as f64;
        let frame = self.frame;

        let index = match (&self.index, self.state) {
            (Some(index), EngineState::Ready) => Arc::clone(index),
            _ => {
                debug!("Tick {} skipped: engine is {:?}", frame, self.state);
                return Ok(TickReport::idle(frame));
            }
        };

        let stages = self.config.stages;
        let capacity = arrival_capacity(
            self.tracer.ray_count(),
            self.config.max_depth as usize,
            self.sources.len(),
            index.triangle_count(),
        );
        self.arrivals.reserve(capacity);

        let listener = self.listener + self.config.listener_offset;
        let occlusion = {
            let scene = TraceScene::new(
                &index,
                stages.use_bvh,
                &self.materials,
                self.sources.traced(),
                listener,
            );

            if stages.ray_tracing {
                self.tracer
                    .dispatch(&scene, &self.settings, frame, self.substrate, &self.arrivals);
            }
            if stages.image_sources {
                cast_image_sources(
                    &scene,
                    self.config.image_source_energy_ratio,
                    self.substrate,
                    &self.arrivals,
                );
            }
            if stages.direct {
                cast_direct(&scene, self.config.direct_energy_ratio, self.substrate, &self.arrivals);
            }
            if stages.occlusion {
                cast_occlusion(
                    &scene,
                    self.config.listener_probe_offset,
                    self.config.source_probe_offset,
                    self.substrate,
                )
            } else {
                Vec::new()
            }
        };

        self.collected.clear();
        self.collected.extend(self.arrivals.iter().copied());
        // Parallel kernels append in any order
        self.collected.sort_by(|a, b| {
            (a.source_id, a.direction_id)
                .cmp(&(b.source_id, b.direction_id))
                .then(a.distance.total_cmp(&b.distance))
        });

        let mut report = TickReport::idle(frame);
        report.count(&self.collected);
        report.dropped = self.arrivals.dropped();
        if report.dropped > 0 {
            warn!(
                "Arrival buffer full: dropped {} of {} arrivals",
                report.dropped,
                report.dropped + self.arrivals.capacity()
            );
        }

        let volume = self.room_volume();
        let sample_rate = self.synth.sample_rate();
        for traced in self.sources.traced() {
            let slot = traced.source.slot;
            let buffer = &mut self.responses[slot];
            self.synth.synthesize(buffer, &self.collected, traced.id(), volume);

            if buffer.is_silent() {
                report.silent.push(slot);
                continue;
            }
            if let Some(sink) = self.sink.as_mut() {
                let label = format!("aura_source_{slot}");
                sink.upload_impulse_response(slot, buffer.samples(), 1, sample_rate, &label)?;
            }
            report.uploaded.push(slot);
        }

        for result in &occlusion {
            self.cutoffs[result.slot] = result.cutoff_hz;
            if !self.simulation_enabled {
                continue;
            }
            if let Some(sink) = self.sink.as_mut() {
                if let Err(err) = sink.set_lowpass_cutoff(result.slot, result.cutoff_hz) {
                    warn!("Sink rejected low-pass for slot {}: {}", result.slot, err);
                }
            }
        }
        report.occlusion = occlusion;

        debug!(
            "Tick {}: {} arrivals ({} direct, {} specular, {} diffuse), {} uploads",
            frame,
            report.arrivals,
            report.direct,
            report.specular,
            report.diffuse,
            report.uploaded.len()
        );
        self.frame += 1;
        Ok(report)
    }
}

impl<S: ReverbSink> std::fmt::Debug for PropagationEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationEngine")
            .field("state", &self.state)
            .field("triangles", &self.index.as_ref().map(|i| i.triangle_count()))
            .field("sources", &self.sources.len())
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use aura_core::{ConfigError, GeometryBuilder, Material};
    use std::sync::Mutex;

    fn room(absorption: f32, scattering: f32) -> (Geometry, MaterialLibrary) {
        let mut materials = MaterialLibrary::new();
        let wall = materials.add(Material::uniform("wall", absorption, scattering));
        let mut builder = GeometryBuilder::new();
        builder.add_shoebox(Vec3::splat(-4.0), Vec3::splat(4.0), wall);
        (builder.finish(), materials)
    }

    fn config() -> EngineConfig {
        EngineConfig::new().num_rays(64).max_depth(4).sample_rate(8000)
    }

    fn ready_engine() -> PropagationEngine<MemorySink> {
        let mut engine = PropagationEngine::new(config(), Some(MemorySink::new(3)));
        let (geometry, materials) = room(0.3, 0.2);
        engine.reload_scene(Some(geometry), materials).unwrap();
        engine
    }

    #[test]
    fn test_invalid_config_stays_uninitialized() {
        let mut engine = PropagationEngine::new(config().num_rays(4), Some(MemorySink::new(1)));
        assert!(matches!(engine.init_error(), Some(InitializationError::Config(_))));

        let (geometry, materials) = room(0.3, 0.2);
        assert!(engine.reload_scene(Some(geometry), materials).is_err());
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let report = engine.tick(0.016).unwrap();
        assert_eq!(report, TickReport::idle(0));
        assert_eq!(engine.frame(), 0);
    }

    #[test]
    fn test_oversized_config_allocates_nothing() {
        let engine = PropagationEngine::new(config().num_rays(u32::MAX), Some(MemorySink::new(3)));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(matches!(
            engine.init_error(),
            Some(InitializationError::Config(ConfigError::OutOfRange { field: "num_rays", .. }))
        ));
        assert_eq!(engine.sources().capacity(), 0);
        assert!(engine.response(0).is_none());

        let engine = PropagationEngine::new(config().response_length(3600.0), Some(MemorySink::new(3)));
        assert!(matches!(
            engine.init_error(),
            Some(InitializationError::Config(ConfigError::OutOfRange { field: "response_length", .. }))
        ));
        assert!(engine.response(0).is_none());
    }

    #[test]
    fn test_missing_geometry_and_materials() {
        let mut engine = PropagationEngine::new(config(), Some(MemorySink::new(1)));
        let err = engine.reload_scene(None, MaterialLibrary::new()).unwrap_err();
        assert!(matches!(err, EngineError::Init(InitializationError::MissingGeometry)));

        let (geometry, _) = room(0.3, 0.2);
        let err = engine.reload_scene(Some(geometry), MaterialLibrary::new()).unwrap_err();
        assert!(matches!(err, EngineError::Init(InitializationError::MissingMaterials)));
        assert_eq!(engine.init_error(), Some(&InitializationError::MissingMaterials));
    }

    #[test]
    fn test_no_sink_is_geometry_only() {
        let mut engine = PropagationEngine::<MemorySink>::new(config(), None);
        let (geometry, materials) = room(0.3, 0.2);
        let state = engine.reload_scene(Some(geometry), materials).unwrap();

        assert_eq!(state, EngineState::GeometryOnly);
        assert_eq!(engine.index().unwrap().triangle_count(), 12);
        assert_eq!(engine.init_error(), Some(&InitializationError::MissingChannels));
        assert!(matches!(
            engine.add_source(Vec3::X),
            Err(EngineError::NotReady(EngineState::GeometryOnly))
        ));
    }

    #[test]
    fn test_slots_bounded_by_sink_channels() {
        let mut engine = PropagationEngine::new(config().max_sources(3), Some(MemorySink::new(2)));
        let (geometry, materials) = room(0.3, 0.2);
        engine.reload_scene(Some(geometry), materials).unwrap();

        engine.add_source(Vec3::X).unwrap();
        engine.add_source(Vec3::Y).unwrap();
        let err = engine.add_source(Vec3::Z).unwrap_err();
        assert!(matches!(err, EngineError::Capacity(CapacityError::SlotsExhausted { capacity: 2 })));
        assert_eq!(engine.sources().len(), 2);
    }

    #[test]
    fn test_events_emitted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut engine = PropagationEngine::new(config(), Some(MemorySink::new(2)));
        let log = Arc::clone(&seen);
        engine.subscribe(move |event| log.lock().unwrap().push(*event));

        let (geometry, materials) = room(0.3, 0.2);
        engine.reload_scene(Some(geometry), materials).unwrap();
        let handle = engine.add_source(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        engine.set_listener(Vec3::new(0.0, 1.0, 0.0));
        engine.set_listener(Vec3::new(0.0, 1.0, 0.0));
        engine.remove_source(handle).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                EngineEvent::Initialized { triangles: 12, ready: true },
                EngineEvent::SourceAdded { slot: 0, position: Vec3::new(1.0, 0.0, 0.0) },
                EngineEvent::ListenerMoved { position: Vec3::new(0.0, 1.0, 0.0) },
                EngineEvent::SourceRemoved { slot: 0 },
            ]
        );
    }

    #[test]
    fn test_remove_unknown_source() {
        let mut engine = ready_engine();
        let handle = engine.add_source(Vec3::X).unwrap();
        engine.remove_source(handle).unwrap();
        assert!(matches!(engine.remove_source(handle), Err(EngineError::UnknownSource(0))));
        assert!(matches!(engine.move_source(handle, Vec3::Y), Err(EngineError::UnknownSource(0))));
    }

    #[test]
    fn test_tick_uploads_response() {
        let mut engine = ready_engine();
        engine.set_substrate(Substrate::Serial);
        engine.add_source(Vec3::new(2.0, 0.0, 0.0)).unwrap();

        let report = engine.tick(0.02).unwrap();
        assert_eq!(report.frame, 0);
        assert_eq!(report.direct, 1);
        assert!(report.specular > 0);
        assert_eq!(report.uploaded, vec![0]);
        assert_eq!(engine.frame(), 1);

        let channel = engine.sink().unwrap().channel(0).unwrap();
        assert_eq!(channel.uploads, 1);
        assert_eq!(channel.impulse_response.len(), 8000);
        assert_eq!(channel.label, "aura_source_0");
        assert_eq!(channel.lowpass_hz, 22000.0);
    }

    #[test]
    fn test_disabled_stages_give_silence() {
        let mut engine = PropagationEngine::new(
            config().stages(aura_core::StageToggles {
                direct: false,
                image_sources: false,
                ray_tracing: false,
                ..Default::default()
            }),
            Some(MemorySink::new(1)),
        );
        let (geometry, materials) = room(0.3, 0.2);
        engine.reload_scene(Some(geometry), materials).unwrap();
        engine.add_source(Vec3::X).unwrap();

        let report = engine.tick(0.02).unwrap();
        assert_eq!(report.arrivals, 0);
        assert_eq!(report.silent, vec![0]);
        assert!(report.uploaded.is_empty());
        assert_eq!(engine.sink().unwrap().channel(0).unwrap().uploads, 0);
        assert_eq!(report.occlusion.len(), 1);
    }

    #[test]
    fn test_simulation_bypass_restores_cutoffs() {
        let mut engine = ready_engine();
        engine.add_source(Vec3::X).unwrap();
        engine.cutoffs[0] = 15400.0;

        engine.set_simulation_enabled(false);
        let channel = engine.sink().unwrap().channel(0).unwrap();
        assert_eq!(channel.wet_percent, 0.0);
        assert_eq!(channel.lowpass_hz, OPEN_CUTOFF_HZ);

        engine.set_simulation_enabled(true);
        let channel = engine.sink().unwrap().channel(0).unwrap();
        assert_eq!(channel.wet_percent, 100.0);
        assert_eq!(channel.lowpass_hz, 15400.0);
    }

    #[test]
    fn test_reload_recomputes_images() {
        let mut engine = ready_engine();
        let handle = engine.add_source(Vec3::X).unwrap();
        assert_eq!(engine.sources().get(handle).unwrap().images.len(), 12);

        let mut materials = MaterialLibrary::new();
        let wall = materials.add(Material::uniform("wall", 0.5, 0.0));
        let mut builder = GeometryBuilder::new();
        builder.add_shoebox(Vec3::splat(-4.0), Vec3::splat(4.0), wall);
        builder.add_shoebox(Vec3::splat(-1.0), Vec3::new(-0.5, -0.5, -0.5), wall);
        engine.reload_scene(Some(builder.finish()), materials).unwrap();

        assert_eq!(engine.sources().get(handle).unwrap().images.len(), 24);
    }
}
