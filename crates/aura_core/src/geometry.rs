//! Triangle arena and mesh ranges.
//!
//! Mesh import and decimation happen upstream; this module only flattens
//! already-triangulated meshes into the contiguous triangle list that the
//! BVH reorders and the tracer reads.

use aura_math::{Aabb, Mat4, Vec3};
use bytemuck::{Pod, Zeroable};

use crate::error::InitializationError;
use crate::material::MaterialLibrary;

/// A scene triangle with per-vertex normals and a material index.
///
/// `#[repr(C)]` so the arena can be written to the geometry cache (and handed
/// to a compute device) without conversion.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Triangle {
    pub pos_a: Vec3,
    pub pos_b: Vec3,
    pub pos_c: Vec3,
    pub normal_a: Vec3,
    pub normal_b: Vec3,
    pub normal_c: Vec3,
    pub material_index: u32,
}

impl Triangle {
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], material_index: u32) -> Self {
        Self {
            pos_a: positions[0],
            pos_b: positions[1],
            pos_c: positions[2],
            normal_a: normals[0],
            normal_b: normals[1],
            normal_c: normals[2],
            material_index,
        }
    }

    /// Triangle whose vertex normals all equal the face normal.
    pub fn flat(a: Vec3, b: Vec3, c: Vec3, material_index: u32) -> Self {
        let n = (b - a).cross(c - a).normalize_or_zero();
        Self::new([a, b, c], [n; 3], material_index)
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.pos_a, self.pos_b, self.pos_c]
    }

    /// Unit normal of the plane through the three positions, `(B-A) x (C-A)`.
    ///
    /// Zero for degenerate triangles.
    pub fn plane_normal(&self) -> Vec3 {
        (self.pos_b - self.pos_a)
            .cross(self.pos_c - self.pos_a)
            .normalize_or_zero()
    }

    pub fn centroid(&self) -> Vec3 {
        (self.pos_a + self.pos_b + self.pos_c) / 3.0
    }

    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.grow(&mut bounds);
        bounds
    }

    /// Grow `bounds` to include all three vertices.
    pub fn grow(&self, bounds: &mut Aabb) {
        bounds.grow(self.pos_a);
        bounds.grow(self.pos_b);
        bounds.grow(self.pos_c);
    }
}

/// Contiguous triangle range belonging to one imported mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MeshRange {
    pub first_triangle: u32,
    pub count: u32,
}

/// Triangles plus the mesh ranges they were imported as.
///
/// Mesh ranges describe import order. Building the BVH reorders the
/// triangles, after which the ranges are only kept for the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub triangles: Vec<Triangle>,
    pub meshes: Vec<MeshRange>,
}

impl Geometry {
    pub fn new(triangles: Vec<Triangle>, meshes: Vec<MeshRange>) -> Self {
        Self { triangles, meshes }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds of every triangle ([`Aabb::EMPTY`] for an empty scene).
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for tri in &self.triangles {
            tri.grow(&mut bounds);
        }
        bounds
    }

    /// Check that every triangle refers to a material in `materials`.
    pub fn check_materials(&self, materials: &MaterialLibrary) -> Result<(), InitializationError> {
        if materials.is_empty() {
            return Err(InitializationError::MissingMaterials);
        }
        match self
            .triangles
            .iter()
            .position(|t| t.material_index as usize >= materials.len())
        {
            Some(triangle) => Err(InitializationError::UnknownMaterial {
                triangle,
                material: self.triangles[triangle].material_index,
                available: materials.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Accumulates meshes into a [`Geometry`].
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    geometry: Geometry,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an indexed triangle mesh transformed into world space.
    ///
    /// Positions go through `transform` as points and normals as directions.
    /// If `normals` is missing or does not match the vertex count, smooth
    /// normals are computed from the faces. Faces with out-of-range indices
    /// are skipped.
    pub fn add_mesh(
        &mut self,
        positions: &[Vec3],
        normals: Option<&[Vec3]>,
        indices: &[u32],
        transform: Mat4,
        material_index: u32,
    ) -> MeshRange {
        let computed;
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            Some(n) => {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    n.len(),
                    positions.len()
                );
                computed = smooth_normals(positions, indices);
                &computed
            }
            None => {
                computed = smooth_normals(positions, indices);
                &computed
            }
        };

        let first_triangle = self.geometry.triangles.len() as u32;
        let mut skipped = 0;

        for face in indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                skipped += 1;
                continue;
            }
            let p = [i0, i1, i2].map(|i| transform.transform_point3(positions[i]));
            let n = [i0, i1, i2].map(|i| transform.transform_vector3(normals[i]).normalize_or_zero());
            self.geometry.triangles.push(Triangle::new(p, n, material_index));
        }

        if skipped > 0 {
            log::warn!("Skipped {} faces with out-of-range vertex indices", skipped);
        }

        let range = MeshRange {
            first_triangle,
            count: self.geometry.triangles.len() as u32 - first_triangle,
        };
        self.geometry.meshes.push(range);
        range
    }

    /// Append a closed axis-aligned room whose faces point inwards.
    pub fn add_shoebox(&mut self, min: Vec3, max: Vec3, material_index: u32) -> MeshRange {
        let first_triangle = self.geometry.triangles.len() as u32;
        let bounds = Aabb::from_points(min, max);
        let center = bounds.centroid();

        for axis in 0..3 {
            let (u, w) = ((axis + 1) % 3, (axis + 2) % 3);
            for side in [bounds.min[axis], bounds.max[axis]] {
                let corner = |cu: f32, cw: f32| {
                    let mut p = Vec3::ZERO;
                    p[axis] = side;
                    p[u] = cu;
                    p[w] = cw;
                    p
                };
                let quad = [
                    corner(bounds.min[u], bounds.min[w]),
                    corner(bounds.max[u], bounds.min[w]),
                    corner(bounds.max[u], bounds.max[w]),
                    corner(bounds.min[u], bounds.max[w]),
                ];
                let mut inward = Vec3::ZERO;
                inward[axis] = (center[axis] - side).signum();

                for (a, b, c) in [(quad[0], quad[1], quad[2]), (quad[0], quad[2], quad[3])] {
                    let tri = Triangle::flat(a, b, c, material_index);
                    let tri = if tri.plane_normal().dot(inward) < 0.0 {
                        Triangle::flat(a, c, b, material_index)
                    } else {
                        tri
                    };
                    self.geometry.triangles.push(tri);
                }
            }
        }

        let range = MeshRange {
            first_triangle,
            count: self.geometry.triangles.len() as u32 - first_triangle,
        };
        self.geometry.meshes.push(range);
        range
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.triangles.len()
    }

    pub fn finish(self) -> Geometry {
        log::info!(
            "Built geometry with {} triangles and {} meshes",
            self.geometry.triangles.len(),
            self.geometry.meshes.len()
        );
        self.geometry
    }
}

/// Smooth vertex normals by averaging the (area-weighted) face normals.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for face in indices.chunks_exact(3) {
        let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let face_normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    for normal in &mut normals {
        // Default up normal for degenerate cases
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }
    normals
}
