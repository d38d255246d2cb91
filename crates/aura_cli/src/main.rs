// Offline driver for the propagation engine.
// Run with: cargo run --release --bin aura -- <command> [args]

use std::path::Path;

use anyhow::{bail, Context, Result};
use aura_core::{load_geometry, EngineConfig, Geometry, GeometryBuilder, Material, MaterialLibrary};
use aura_engine::{MemorySink, PropagationEngine};
use aura_ir::{downsample_to, ResponseBuffer};
use aura_math::Vec3;
use aura_trace::{load_bvh, SpatialIndex};

const USAGE: &str = "Usage:
  aura demo [config.json]                   simulate a small room and print the responses
  aura bake <geometry> <bvh> [config.json]  build the demo room and write its caches
  aura inspect <geometry> <bvh>             validate a pair of caches and print BVH stats";

/// Points printed per response envelope.
const ENVELOPE_POINTS: usize = 24;

fn load_config(path: Option<&String>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
    let config: EngineConfig =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path))?;
    Ok(config)
}

/// A 12 x 4 x 8 m hall with a concrete floor, plaster walls and a wooden stage.
fn demo_room() -> (Geometry, MaterialLibrary) {
    let mut materials = MaterialLibrary::new();
    let plaster = materials.add(Material::new(
        "plaster",
        [0.013, 0.015, 0.02, 0.03],
        [0.1, 0.1, 0.15, 0.2],
    ));
    let concrete = materials.add(Material::new(
        "concrete",
        [0.01, 0.02, 0.02, 0.03],
        [0.05, 0.1, 0.1, 0.15],
    ));
    let wood = materials.add(Material::new(
        "wood",
        [0.15, 0.1, 0.07, 0.07],
        [0.2, 0.3, 0.4, 0.5],
    ));

    let mut builder = GeometryBuilder::new();
    builder.add_shoebox(Vec3::new(-6.0, 0.0, -4.0), Vec3::new(6.0, 4.0, 4.0), plaster);
    // Floor slab and stage block sit inside the shell
    builder.add_mesh(
        &[
            Vec3::new(-6.0, 0.01, -4.0),
            Vec3::new(-6.0, 0.01, 4.0),
            Vec3::new(6.0, 0.01, 4.0),
            Vec3::new(6.0, 0.01, -4.0),
        ],
        None,
        &[0, 1, 2, 0, 2, 3],
        aura_math::Mat4::IDENTITY,
        concrete,
    );
    let stage = {
        let mut stage = GeometryBuilder::new();
        stage.add_shoebox(Vec3::new(-1.0, -0.3, -1.5), Vec3::new(1.0, 0.3, 1.5), wood);
        stage.finish()
    };
    // Outward-facing box: reverse the winding of the inward shoebox
    let positions: Vec<Vec3> = stage.triangles.iter().flat_map(|t| t.positions()).collect();
    let indices: Vec<u32> = (0..stage.triangles.len() as u32)
        .flat_map(|t| [t * 3, t * 3 + 2, t * 3 + 1])
        .collect();
    builder.add_mesh(
        &positions,
        None,
        &indices,
        aura_math::Mat4::from_translation(Vec3::new(4.5, 0.3, 0.0)),
        wood,
    );

    (builder.finish(), materials)
}

fn demo(config_path: Option<&String>) -> Result<()> {
    let config = load_config(config_path)?;
    let (geometry, materials) = demo_room();
    let sample_rate = config.sample_rate;

    let mut engine = PropagationEngine::new(config, Some(MemorySink::new(3)));
    engine
        .reload_scene(Some(geometry), materials)
        .context("Failed to initialize the demo scene")?;
    engine.set_listener(Vec3::new(-3.0, 1.7, 0.0));

    let sources = [Vec3::new(4.0, 1.5, 1.0), Vec3::new(0.0, 1.2, -3.0)];
    for position in sources {
        engine.add_source(position).context("Failed to add source")?;
    }

    for _ in 0..4 {
        let report = engine.tick(1.0 / 60.0).context("Tick failed")?;
        println!(
            "frame {}: {} arrivals ({} direct, {} specular, {} diffuse), {} dropped",
            report.frame, report.arrivals, report.direct, report.specular, report.diffuse, report.dropped
        );
        for occlusion in &report.occlusion {
            println!(
                "  slot {}: {} of 9 probes occluded, low-pass {:.0} Hz",
                occlusion.slot, occlusion.occluded, occlusion.cutoff_hz
            );
        }
    }

    let sink = engine.sink().context("Engine has no sink")?;
    for (slot, channel) in sink.channels().iter().enumerate().filter(|(_, c)| c.uploads > 0) {
        let peak = engine.response(slot).map_or(0.0, ResponseBuffer::peak);
        println!(
            "\n{} ({} samples at {} Hz, peak {:.5}, {} uploads):",
            channel.label,
            channel.impulse_response.len(),
            sample_rate,
            peak,
            channel.uploads
        );
        let envelope: Vec<f32> = channel.impulse_response.iter().map(|s| s.abs()).collect();
        for (i, value) in downsample_to(&envelope, ENVELOPE_POINTS).iter().enumerate() {
            let bar = if peak > 0.0 { (value / peak * 40.0) as usize } else { 0 };
            println!("  slot {} [{:2}] {:.5} {}", slot, i, value, "#".repeat(bar));
        }
    }
    Ok(())
}

fn bake(geometry_path: &str, bvh_path: &str, config_path: Option<&String>) -> Result<()> {
    let config = load_config(config_path)?;
    let (geometry, materials) = demo_room();

    let mut engine = PropagationEngine::<MemorySink>::new(config, None);
    let state = engine
        .reload_scene(Some(geometry), materials)
        .context("Failed to build the demo scene")?;
    log::info!("Scene built ({:?})", state);

    engine
        .bake(geometry_path, bvh_path)
        .with_context(|| format!("Failed to write caches {} and {}", geometry_path, bvh_path))?;
    println!("Wrote {} and {}", geometry_path, bvh_path);
    Ok(())
}

fn inspect(geometry_path: &str, bvh_path: &str) -> Result<()> {
    let geometry = load_geometry(Path::new(geometry_path))
        .with_context(|| format!("Failed to load geometry cache {}", geometry_path))?;
    let bvh = load_bvh(Path::new(bvh_path)).with_context(|| format!("Failed to load BVH cache {}", bvh_path))?;

    println!("Triangles: {}", geometry.triangle_count());
    println!("Meshes: {}", geometry.meshes.len());
    let bounds = geometry.bounds();
    println!("Bounds: {} .. {} ({:.1} m^3)", bounds.min, bounds.max, bounds.volume());

    let index = SpatialIndex::from_parts(geometry.triangles, bvh).context("BVH does not match geometry")?;
    let stats = index.stats().context("BVH failed validation")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("demo") => demo(args.get(2)),
        Some("bake") if args.len() >= 4 => bake(&args[2], &args[3], args.get(4)),
        Some("inspect") if args.len() >= 4 => inspect(&args[2], &args[3]),
        _ => {
            eprintln!("{}", USAGE);
            bail!("Missing or unknown command");
        }
    }
}
