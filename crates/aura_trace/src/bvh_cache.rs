//! BVH node cache.
//!
//! `i32 node_count`, then per node six `f32` bounds (min then max) and two
//! `i32` (index, triangle count), all little-endian.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use aura_core::cache::{read_records, write_records};
use aura_core::{CacheError, CacheResult};

use crate::bvh::{Bvh, BvhNode};

pub fn write_bvh<W: Write>(writer: &mut W, bvh: &Bvh) -> CacheResult<()> {
    write_records(writer, bvh.nodes())
}

pub fn read_bvh<R: Read>(reader: &mut R) -> CacheResult<Bvh> {
    let nodes: Vec<BvhNode> = read_records(reader, "BVH node")?;
    Bvh::from_nodes(nodes).map_err(|e| CacheError::Invalid(e.to_string()))
}

pub fn save_bvh(path: impl AsRef<Path>, bvh: &Bvh) -> CacheResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_bvh(&mut writer, bvh)?;
    writer.flush()?;
    log::info!("Saved {} BVH nodes to {}", bvh.nodes().len(), path.display());
    Ok(())
}

pub fn load_bvh(path: impl AsRef<Path>) -> CacheResult<Bvh> {
    let path = path.as_ref();
    let bvh = read_bvh(&mut BufReader::new(File::open(path)?))?;
    log::info!("Loaded {} BVH nodes from {}", bvh.nodes().len(), path.display());
    Ok(bvh)
}
