use bevy::{
    mesh::{Indices, Mesh, VertexAttributeValues},
    prelude::*,
};

use crate::error::{BendError, BendResult};

/// A template vertex before bending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Vertex position, with X along the bend axis.
    pub position: Vec3,
    /// Vertex normal.
    pub normal: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
}

impl MeshVertex {
    /// Create a vertex.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// An immutable snapshot of the template mesh, ready to be bent.
///
/// Vertices are stored after the builder's translate/rotate/scale step. The
/// X axis is the bend axis: `min_x` and `length` describe the span that
/// gets mapped onto the curve. A different transform means building a new
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMesh {
    vertices: Vec<MeshVertex>,
    triangles: Vec<u32>,
    min_x: f32,
    length: f32,
}

impl SourceMesh {
    /// Start building a snapshot from raw buffers.
    pub fn build(vertices: Vec<MeshVertex>, triangles: Vec<u32>) -> SourceMeshBuilder {
        SourceMeshBuilder::new(vertices, triangles)
    }

    /// Start building a snapshot from a Bevy mesh.
    ///
    /// Positions and normals are required; missing UVs default to zero.
    /// An unindexed mesh is read as a plain triangle list.
    pub fn from_mesh(mesh: &Mesh) -> BendResult<SourceMeshBuilder> {
        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => values,
            Some(_) => return Err(BendError::UnsupportedAttributeFormat("position")),
            None => return Err(BendError::MissingAttribute("position")),
        };
        let normals = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
            Some(VertexAttributeValues::Float32x3(values)) => values,
            Some(_) => return Err(BendError::UnsupportedAttributeFormat("normal")),
            None => return Err(BendError::MissingAttribute("normal")),
        };
        let uvs = match mesh.attribute(Mesh::ATTRIBUTE_UV_0) {
            Some(VertexAttributeValues::Float32x2(values)) => Some(values),
            Some(_) => return Err(BendError::UnsupportedAttributeFormat("uv")),
            None => None,
        };

        let vertices: Vec<MeshVertex> = positions
            .iter()
            .zip(normals.iter())
            .enumerate()
            .map(|(i, (p, n))| MeshVertex {
                position: Vec3::new(p[0], p[1], p[2]),
                normal: Vec3::new(n[0], n[1], n[2]),
                uv: uvs
                    .and_then(|uvs| uvs.get(i))
                    .map(|uv| Vec2::new(uv[0], uv[1]))
                    .unwrap_or(Vec2::ZERO),
            })
            .collect();

        let triangles: Vec<u32> = match mesh.indices() {
            Some(Indices::U32(indices)) => indices.clone(),
            Some(Indices::U16(indices)) => indices.iter().map(|&i| i as u32).collect(),
            None => (0..vertices.len() as u32).collect(),
        };

        Ok(SourceMeshBuilder::new(vertices, triangles))
    }

    /// The transformed template vertices.
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// The template triangle list.
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Smallest X over all vertices, the start of the bend span.
    pub fn min_x(&self) -> f32 {
        self.min_x
    }

    /// X extent of the template, the length mapped onto the curve.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Whether the snapshot holds no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Builder applying an optional rigid transform to template buffers.
///
/// The transform runs rotate, then scale, then translate. A mirroring scale
/// (negative volume) flips triangle winding so faces keep pointing outward.
#[derive(Debug, Clone)]
pub struct SourceMeshBuilder {
    vertices: Vec<MeshVertex>,
    triangles: Vec<u32>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl SourceMeshBuilder {
    fn new(vertices: Vec<MeshVertex>, triangles: Vec<u32>) -> Self {
        Self {
            vertices,
            triangles,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Translate the template before bending.
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Rotate the template before bending.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Scale the template before bending.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Apply the transform and freeze the snapshot.
    pub fn finish(self) -> BendResult<SourceMesh> {
        if self.vertices.is_empty() {
            return Err(BendError::EmptySource);
        }

        let mut vertices = self.vertices;
        for vertex in &mut vertices {
            vertex.position = (self.rotation * vertex.position) * self.scale + self.translation;
            vertex.normal = ((self.rotation * vertex.normal) * self.scale).normalize_or_zero();
        }

        let mut triangles = self.triangles;
        if self.scale.x * self.scale.y * self.scale.z < 0.0 {
            for triangle in triangles.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }

        let min_x = vertices
            .iter()
            .map(|v| v.position.x)
            .fold(f32::INFINITY, f32::min);
        let max_x = vertices
            .iter()
            .map(|v| v.position.x)
            .fold(f32::NEG_INFINITY, f32::max);

        Ok(SourceMesh {
            vertices,
            triangles,
            min_x,
            length: max_x - min_x,
        })
    }
}
