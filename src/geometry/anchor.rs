// SPDX-License-Identifier: GPL-3.0-only

//! Mesh anchors as delivered by the capture backend

use super::{BufferLayout, RawBufferView};
use crate::constants::layout::PRIMITIVE_TRIANGLE;
use crate::errors::ReconstructionError;
use glam::{Mat4, Vec3};
use uuid::Uuid;

/// Raw face/index buffer of one anchor
///
/// `primitive_type` is the backend's raw code and is only interpreted when
/// the index buffer is built, so unknown codes surface as reconstruction
/// errors instead of being coerced here.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBuffer {
    /// Packed index bytes in native byte order
    pub data: Vec<u8>,
    /// Number of primitives (faces)
    pub count: usize,
    /// Width of a single index in bytes
    pub bytes_per_index: usize,
    /// Indices per primitive (2 for lines, 3 for triangles)
    pub index_count_per_primitive: usize,
    /// Raw primitive code (0 = line, 1 = triangle)
    pub primitive_type: u32,
}

impl FaceBuffer {
    /// Triangle faces with 32-bit indices
    pub fn triangles_u32(indices: &[u32]) -> Self {
        Self {
            data: bytemuck::cast_slice::<u32, u8>(indices).to_vec(),
            count: indices.len() / 3,
            bytes_per_index: 4,
            index_count_per_primitive: 3,
            primitive_type: PRIMITIVE_TRIANGLE,
        }
    }

    /// Total number of indices the faces reference
    pub fn index_count(&self) -> usize {
        self.count.saturating_mul(self.index_count_per_primitive)
    }
}

/// Local-space geometry owned by one anchor
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGeometry {
    vertices: RawBufferView<Vec<u8>>,
    normals: RawBufferView<Vec<u8>>,
    faces: FaceBuffer,
}

impl AnchorGeometry {
    /// Take ownership of raw vertex, normal and face buffers
    pub fn new(
        vertex_bytes: Vec<u8>,
        vertex_layout: BufferLayout,
        normal_bytes: Vec<u8>,
        normal_layout: BufferLayout,
        faces: FaceBuffer,
    ) -> Result<Self, ReconstructionError> {
        let vertices = RawBufferView::new(vertex_bytes, vertex_layout)?;
        let normals = RawBufferView::new(normal_bytes, normal_layout)?;
        Self::from_views(vertices, normals, faces)
    }

    fn from_views(
        vertices: RawBufferView<Vec<u8>>,
        normals: RawBufferView<Vec<u8>>,
        faces: FaceBuffer,
    ) -> Result<Self, ReconstructionError> {
        if vertices.len() != normals.len() {
            return Err(ReconstructionError::NormalCountMismatch {
                vertices: vertices.len(),
                normals: normals.len(),
            });
        }
        Ok(Self {
            vertices,
            normals,
            faces,
        })
    }

    /// Packed Float3 positions and normals with the given faces
    pub fn from_positions(
        positions: &[Vec3],
        normals: &[Vec3],
        faces: FaceBuffer,
    ) -> Result<Self, ReconstructionError> {
        Self::from_views(
            RawBufferView::from_vec3s(positions),
            RawBufferView::from_vec3s(normals),
            faces,
        )
    }

    pub fn vertices(&self) -> RawBufferView<&[u8]> {
        self.vertices.as_view()
    }

    pub fn normals(&self) -> RawBufferView<&[u8]> {
        self.normals.as_view()
    }

    pub fn faces(&self) -> &FaceBuffer {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// A tracked surface patch with its own local mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAnchor {
    pub id: Uuid,
    /// Anchor-local to world transform
    pub transform: Mat4,
    pub geometry: AnchorGeometry,
}

impl MeshAnchor {
    pub fn new(transform: Mat4, geometry: AnchorGeometry) -> Self {
        Self::with_id(Uuid::new_v4(), transform, geometry)
    }

    pub fn with_id(id: Uuid, transform: Mat4, geometry: AnchorGeometry) -> Self {
        Self {
            id,
            transform,
            geometry,
        }
    }

    /// World position of the anchor origin
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_count_must_match() {
        let result = AnchorGeometry::from_positions(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[Vec3::Z, Vec3::Z],
            FaceBuffer::triangles_u32(&[0, 1, 2]),
        );
        assert_eq!(
            result,
            Err(ReconstructionError::NormalCountMismatch {
                vertices: 3,
                normals: 2
            })
        );
    }

    #[test]
    fn test_anchor_position_is_translation_column() {
        let geometry = AnchorGeometry::from_positions(
            &[Vec3::ZERO],
            &[Vec3::Z],
            FaceBuffer::triangles_u32(&[]),
        )
        .unwrap();
        let anchor = MeshAnchor::new(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), geometry);
        assert_eq!(anchor.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_triangle_face_counts() {
        let faces = FaceBuffer::triangles_u32(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(faces.count, 2);
        assert_eq!(faces.index_count(), 6);
        assert_eq!(faces.data.len(), 24);
    }
}
