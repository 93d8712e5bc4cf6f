// SPDX-License-Identifier: GPL-3.0-only

//! Mesh reconstruction pipeline
//!
//! Turns the anchors of one capture frame into a single static scene:
//! 1. Copy each anchor's vertices and rewrite them in world space
//! 2. Copy normals and face indices into renderer-facing buffers
//! 3. Optionally project texture coordinates against the capture camera
//! 4. Collect one [`RenderableMesh`] per anchor, in input order

mod buffers;
mod gltf_export;

pub use buffers::{IndexBuffer, IndexWidth, Material, PrimitiveType, Submesh, VertexBuffer};
pub use gltf_export::{export_scene_glb, export_scene_glb_async};

use crate::camera::{CameraModel, TextureCoordinate, TextureProjector};
use crate::errors::ReconstructionError;
use crate::geometry::{FaceBuffer, MeshAnchor, RawBufferView, transform_to_world};
use glam::{Mat4, Vec3};
use tracing::{debug, info};
use uuid::Uuid;

/// Renderable geometry of one anchor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableMesh {
    /// Anchor this mesh was built from
    pub anchor_id: Uuid,
    /// World-space positions
    pub vertices: VertexBuffer,
    /// Normals as delivered by the anchor (anchor-local orientation)
    pub normals: VertexBuffer,
    pub indices: IndexBuffer,
    pub submesh: Submesh,
    pub texture_coordinates: Option<Vec<TextureCoordinate>>,
}

impl RenderableMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn has_texture_coordinates(&self) -> bool {
        self.texture_coordinates.is_some()
    }
}

/// Ordered, immutable collection of per-anchor meshes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneModel {
    meshes: Vec<RenderableMesh>,
}

impl SceneModel {
    pub fn meshes(&self) -> &[RenderableMesh] {
        &self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderableMesh> {
        self.meshes.iter()
    }

    /// Total vertices across all meshes
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(RenderableMesh::vertex_count).sum()
    }

    /// Axis-aligned bounds of all world-space vertices, None when there are none
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        for mesh in &self.meshes {
            for index in 0..mesh.vertices.len() {
                let Ok(p) = mesh.vertices.read(index) else {
                    continue;
                };
                bounds = Some(match bounds {
                    Some((min, max)) => (min.min(p), max.max(p)),
                    None => (p, p),
                });
            }
        }
        bounds
    }
}

impl<'a> IntoIterator for &'a SceneModel {
    type Item = &'a RenderableMesh;
    type IntoIter = std::slice::Iter<'a, RenderableMesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.meshes.iter()
    }
}

/// Builds renderable meshes from anchor geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshAssembler {
    need_texture: bool,
    projector: TextureProjector,
}

impl MeshAssembler {
    pub fn new(need_texture: bool) -> Self {
        Self {
            need_texture,
            projector: TextureProjector::new(),
        }
    }

    pub fn need_texture(&self) -> bool {
        self.need_texture
    }

    /// Copy the face indices with their primitive type and index width
    pub fn build_index_buffer(&self, faces: &FaceBuffer) -> Result<IndexBuffer, ReconstructionError> {
        IndexBuffer::from_faces(faces)
    }

    /// One submesh covering every face, with the placeholder material
    pub fn build_submesh(&self, faces: &FaceBuffer, index_buffer: &IndexBuffer) -> Submesh {
        let primitive = index_buffer.primitive();
        Submesh {
            primitive,
            index_count: faces.count * primitive.indices_per_primitive(),
            material: Material::placeholder(),
        }
    }

    /// Copy `vertices` and rewrite the copy in world space
    pub fn build_vertex_buffer<B: AsRef<[u8]>>(
        &self,
        vertices: &RawBufferView<B>,
        anchor_transform: &Mat4,
    ) -> Result<VertexBuffer, ReconstructionError> {
        let mut buffer = vertices.to_owned_view();
        transform_to_world(&mut buffer, anchor_transform)?;
        Ok(buffer)
    }

    /// Assemble one anchor's buffers into a renderable mesh
    ///
    /// With `need_texture` set, `camera` is required; without it the call
    /// fails with `MissingCameraModel` and the caller may retry untextured.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble<B: AsRef<[u8]>, N: AsRef<[u8]>>(
        &self,
        anchor_id: Uuid,
        vertices: &RawBufferView<B>,
        normals: &RawBufferView<N>,
        faces: &FaceBuffer,
        anchor_transform: &Mat4,
        camera: Option<&CameraModel>,
        need_texture: bool,
    ) -> Result<RenderableMesh, ReconstructionError> {
        if vertices.len() != normals.len() {
            return Err(ReconstructionError::NormalCountMismatch {
                vertices: vertices.len(),
                normals: normals.len(),
            });
        }

        let indices = self.build_index_buffer(faces)?;
        if let Some(index) = indices.to_u32().into_iter().find(|&i| i as usize >= vertices.len()) {
            return Err(ReconstructionError::FaceIndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        let submesh = self.build_submesh(faces, &indices);

        let texture_coordinates = if need_texture {
            let camera = camera.ok_or(ReconstructionError::MissingCameraModel)?;
            match self
                .projector
                .project_texture_coordinates(vertices, anchor_transform, camera)
            {
                Ok(coordinates) => Some(coordinates),
                // Nothing to texture on an empty anchor
                Err(ReconstructionError::NoGeometry) => {
                    debug!(anchor = %anchor_id, "Empty anchor, texture unavailable");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let world_vertices = self.build_vertex_buffer(vertices, anchor_transform)?;

        debug!(
            anchor = %anchor_id,
            vertices = world_vertices.len(),
            indices = submesh.index_count,
            primitive = ?submesh.primitive,
            textured = texture_coordinates.is_some(),
            "Assembled anchor mesh"
        );

        Ok(RenderableMesh {
            anchor_id,
            vertices: world_vertices,
            normals: normals.to_owned_view(),
            indices,
            submesh,
            texture_coordinates,
        })
    }

    /// Assemble one mesh per anchor, preserving input order
    ///
    /// Any anchor failing aborts the whole call: no partial scene is returned.
    pub fn assemble_scene(
        &self,
        anchors: &[MeshAnchor],
        camera: Option<&CameraModel>,
    ) -> Result<SceneModel, ReconstructionError> {
        if anchors.is_empty() {
            return Err(ReconstructionError::NoAnchors);
        }

        let meshes = anchors
            .iter()
            .map(|anchor| {
                let geometry = &anchor.geometry;
                self.assemble(
                    anchor.id,
                    &geometry.vertices(),
                    &geometry.normals(),
                    geometry.faces(),
                    &anchor.transform,
                    camera,
                    self.need_texture,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scene = SceneModel { meshes };
        info!(
            meshes = scene.len(),
            vertices = scene.vertex_count(),
            textured = self.need_texture,
            "Scene model assembled"
        );
        Ok(scene)
    }
}
