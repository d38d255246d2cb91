//! Little-endian binary cache codec.
//!
//! Records are plain-old-data structs made of 32-bit fields. Each record is
//! viewed as a slice of `u32` words and every word is written little-endian,
//! so a cache file reads back identically on any host. Record counts are
//! written as `i32`.
//!
//! Geometry cache layout:
//!
//! ```text
//! i32 triangle_count
//! triangle_count x [9 f32 positions, 9 f32 normals, u32 material_index]
//! i32 mesh_count
//! mesh_count x [u32 first_triangle, u32 count]
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bytemuck::Pod;

use crate::error::CacheError;
use crate::geometry::{Geometry, MeshRange, Triangle};

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Write one record as little-endian 32-bit words.
pub fn write_record<T: Pod, W: Write>(writer: &mut W, record: &T) -> CacheResult<()> {
    let words: &[u32] = bytemuck::try_cast_slice(std::slice::from_ref(record))
        .map_err(|e| CacheError::Invalid(format!("record is not word-sized: {e}")))?;
    for word in words {
        writer.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

/// Read one record written by [`write_record`].
pub fn read_record<T: Pod, R: Read>(reader: &mut R) -> CacheResult<T> {
    let mut record = T::zeroed();
    let words: &mut [u32] = bytemuck::try_cast_slice_mut(std::slice::from_mut(&mut record))
        .map_err(|e| CacheError::Invalid(format!("record is not word-sized: {e}")))?;
    let mut bytes = [0u8; 4];
    for word in words.iter_mut() {
        reader.read_exact(&mut bytes)?;
        *word = u32::from_le_bytes(bytes);
    }
    Ok(record)
}

pub fn write_count<W: Write>(writer: &mut W, count: usize) -> CacheResult<()> {
    let count = i32::try_from(count)
        .map_err(|_| CacheError::Invalid(format!("count {count} does not fit in i32")))?;
    writer.write_all(&count.to_le_bytes())?;
    Ok(())
}

pub fn read_count<R: Read>(reader: &mut R, what: &'static str) -> CacheResult<usize> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    let count = i32::from_le_bytes(bytes);
    usize::try_from(count).map_err(|_| CacheError::NegativeCount { what, count })
}

/// Write a count followed by each record.
pub fn write_records<T: Pod, W: Write>(writer: &mut W, records: &[T]) -> CacheResult<()> {
    write_count(writer, records.len())?;
    for record in records {
        write_record(writer, record)?;
    }
    Ok(())
}

/// Read a count followed by that many records.
pub fn read_records<T: Pod, R: Read>(reader: &mut R, what: &'static str) -> CacheResult<Vec<T>> {
    let count = read_count(reader, what)?;
    // Don't trust the header for the allocation size
    let mut records = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        records.push(read_record(reader)?);
    }
    Ok(records)
}

pub fn write_geometry<W: Write>(writer: &mut W, geometry: &Geometry) -> CacheResult<()> {
    write_records(writer, &geometry.triangles)?;
    write_records(writer, &geometry.meshes)?;
    Ok(())
}

pub fn read_geometry<R: Read>(reader: &mut R) -> CacheResult<Geometry> {
    let triangles: Vec<Triangle> = read_records(reader, "triangle")?;
    let meshes: Vec<MeshRange> = read_records(reader, "mesh")?;

    for mesh in &meshes {
        let end = mesh.first_triangle as u64 + mesh.count as u64;
        if end > triangles.len() as u64 {
            return Err(CacheError::Invalid(format!(
                "mesh range {}..{} exceeds {} triangles",
                mesh.first_triangle,
                end,
                triangles.len()
            )));
        }
    }

    Ok(Geometry::new(triangles, meshes))
}

/// Save geometry to a cache file.
pub fn save_geometry(path: impl AsRef<Path>, geometry: &Geometry) -> CacheResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_geometry(&mut writer, geometry)?;
    writer.flush()?;
    log::info!(
        "Saved {} triangles and {} meshes to {}",
        geometry.triangles.len(),
        geometry.meshes.len(),
        path.display()
    );
    Ok(())
}

/// Load geometry from a cache file.
pub fn load_geometry(path: impl AsRef<Path>) -> CacheResult<Geometry> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let geometry = read_geometry(&mut reader)?;
    log::info!(
        "Loaded {} triangles and {} meshes from {}",
        geometry.triangles.len(),
        geometry.meshes.len(),
        path.display()
    );
    Ok(geometry)
}
