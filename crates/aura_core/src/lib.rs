//! Aura Core - scene data model for acoustic propagation.
//!
//! This crate provides:
//!
//! - **Geometry**: `Triangle`, `MeshRange`, `Geometry` and the `GeometryBuilder`
//!   that flattens indexed meshes into the triangle arena
//! - **Acoustics**: `Material`, `EnergyBand`, `Source`, `ImageSource`, `RayArrival`
//! - **Configuration**: `EngineConfig` with range validation
//! - **Caches**: the little-endian binary geometry cache codec
//!
//! # Example
//!
//! ```ignore
//! use aura_core::{GeometryBuilder, Material, MaterialLibrary};
//!
//! let mut materials = MaterialLibrary::new();
//! let concrete = materials.add(Material::uniform("concrete", 0.02, 0.1));
//! let mut builder = GeometryBuilder::new();
//! builder.add_shoebox(Vec3::splat(-5.0), Vec3::splat(5.0), concrete);
//! let geometry = builder.finish();
//! ```

pub mod arrival;
pub mod band;
pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod material;
pub mod source;

// Re-export commonly used types
pub use arrival::{EnergyHistogram, PathKind, RayArrival, SPEED_OF_SOUND};
pub use band::{EnergyBand, NUM_BANDS};
pub use cache::{load_geometry, read_geometry, save_geometry, write_geometry, CacheResult};
pub use config::{EngineConfig, StageToggles, SynthesisMode, MAX_RESPONSE_LENGTH};
pub use error::{CacheError, CapacityError, ConfigError, InitializationError};
pub use geometry::{Geometry, GeometryBuilder, MeshRange, Triangle};
pub use material::{band_index, Material, MaterialLibrary, BAND_EDGES_HZ};
pub use source::{image_sources, ImageSource, SlotPool, Source};
