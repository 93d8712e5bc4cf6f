// SPDX-License-Identifier: GPL-3.0-only

//! GLB scene export
//!
//! Writes a [`SceneModel`] as binary glTF 2.0: one node and one mesh per
//! anchor, positions already in world space so every node has an identity
//! transform. When a captured image is supplied it is embedded as a JPEG
//! base color texture and sampled through TEXCOORD_0.

use super::{RenderableMesh, SceneModel};
use crate::capture::CapturedImage;
use crate::constants::export::GENERATOR;
use crate::constants::material;
use crate::geometry::VertexFormat;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Export the scene as GLB on a blocking worker thread
pub async fn export_scene_glb_async(
    scene: SceneModel,
    texture: Option<CapturedImage>,
    jpeg_quality: u8,
    output_path: PathBuf,
) -> Result<(), String> {
    tokio::task::spawn_blocking(move || {
        export_scene_glb(&scene, texture.as_ref(), jpeg_quality, &output_path)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Export the scene as a GLB file
pub fn export_scene_glb(
    scene: &SceneModel,
    texture: Option<&CapturedImage>,
    jpeg_quality: u8,
    output_path: &Path,
) -> Result<(), String> {
    if scene.is_empty() {
        return Err("Scene has no meshes to export".to_string());
    }

    let textured = texture.is_some() && scene.iter().any(RenderableMesh::has_texture_coordinates);
    if texture.is_some() && !textured {
        warn!("Captured image supplied but no mesh has texture coordinates, exporting untextured");
    }

    let mut builder = GlbBuilder::default();
    let mut meshes = Vec::with_capacity(scene.len());
    let mut nodes = Vec::with_capacity(scene.len());

    for (index, mesh) in scene.iter().enumerate() {
        meshes.push(builder.push_mesh(mesh, textured)?);
        nodes.push(json!({ "mesh": index, "name": mesh.anchor_id.to_string() }));
    }

    let mut document = json!({
        "asset": { "generator": GENERATOR, "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": (0..nodes.len()).collect::<Vec<_>>() }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": [material_json(textured)],
    });

    if let Some(image) = texture.filter(|_| textured) {
        let jpeg = encode_texture_jpeg(image, jpeg_quality)?;
        let view = builder.push_view(&jpeg, None, None);
        document["textures"] = json!([{ "sampler": 0, "source": 0 }]);
        document["samplers"] = json!([{
            "magFilter": 9729,  // LINEAR
            "minFilter": 9987,  // LINEAR_MIPMAP_LINEAR
            "wrapS": 33071,     // CLAMP_TO_EDGE
            "wrapT": 33071      // CLAMP_TO_EDGE
        }]);
        document["images"] = json!([{ "bufferView": view, "mimeType": "image/jpeg" }]);
    }

    let glb = builder.finish(document)?;

    info!(
        meshes = scene.len(),
        vertices = scene.vertex_count(),
        textured,
        bytes = glb.len(),
        path = %output_path.display(),
        "Exporting scene"
    );

    std::fs::write(output_path, glb).map_err(|e| format!("Failed to write GLB file: {}", e))?;
    debug!(path = %output_path.display(), "GLB export complete");
    Ok(())
}

fn material_json(textured: bool) -> Value {
    let mut pbr = json!({
        "baseColorFactor": material::PLACEHOLDER_COLOR,
        "metallicFactor": 0.0,
        "roughnessFactor": 1.0
    });
    if textured {
        pbr["baseColorFactor"] = json!([1.0, 1.0, 1.0, 1.0]);
        pbr["baseColorTexture"] = json!({ "index": 0 });
    }
    json!({
        "name": material::PLACEHOLDER_NAME,
        "pbrMetallicRoughness": pbr,
        "doubleSided": true
    })
}

/// Accumulates the binary chunk plus bufferView/accessor tables
#[derive(Default)]
struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GlbBuilder {
    fn push_view(&mut self, bytes: &[u8], stride: Option<usize>, target: Option<u32>) -> usize {
        // Every view starts 4-byte aligned
        let padding = (4 - (self.bin.len() % 4)) % 4;
        self.bin.extend(std::iter::repeat_n(0u8, padding));

        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len()
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        if let Some(target) = target {
            view["target"] = json!(target);
        }
        self.bin.extend_from_slice(bytes);
        self.views.push(view);
        self.views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn push_floats(&mut self, values: &[f32], components: usize, kind: &str) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|f| f.to_le_bytes()).collect();
        let view = self.push_view(&bytes, Some(components * 4), Some(TARGET_ARRAY_BUFFER));
        self.push_accessor(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": COMPONENT_FLOAT,
            "count": values.len() / components,
            "type": kind
        }))
    }

    /// Append one mesh's attributes and indices, returning its glTF mesh entry
    fn push_mesh(&mut self, mesh: &RenderableMesh, textured: bool) -> Result<Value, String> {
        let positions = mesh
            .vertices
            .read_all()
            .map_err(|e| format!("Failed to read vertices: {}", e))?;
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in &positions {
            min = p.min(min.into()).to_array();
            max = p.max(max.into()).to_array();
        }

        let flat: Vec<f32> = positions.iter().flat_map(|p| p.to_array()).collect();
        let position = self.push_floats(&flat, 3, "VEC3");
        if !positions.is_empty() {
            self.accessors[position]["min"] = json!(min);
            self.accessors[position]["max"] = json!(max);
        }
        let mut attributes = json!({ "POSITION": position });

        if mesh.normals.format() == VertexFormat::Float3 {
            let normals = mesh
                .normals
                .read_all()
                .map_err(|e| format!("Failed to read normals: {}", e))?;
            let flat: Vec<f32> = normals.iter().flat_map(|n| n.to_array()).collect();
            attributes["NORMAL"] = json!(self.push_floats(&flat, 3, "VEC3"));
        } else {
            warn!(format = ?mesh.normals.format(), "Skipping normals in unsupported format");
        }

        if let Some(uvs) = mesh.texture_coordinates.as_ref().filter(|_| textured) {
            let flat: Vec<f32> = uvs.iter().flat_map(|uv| uv.to_array()).collect();
            attributes["TEXCOORD_0"] = json!(self.push_floats(&flat, 2, "VEC2"));
        }

        let indices = mesh.indices.to_u32();
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes, None, Some(TARGET_ELEMENT_ARRAY_BUFFER));
        let index_accessor = self.push_accessor(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": COMPONENT_UNSIGNED_INT,
            "count": indices.len(),
            "type": "SCALAR"
        }));

        Ok(json!({
            "primitives": [{
                "attributes": attributes,
                "indices": index_accessor,
                "material": 0,
                "mode": mesh.submesh.primitive.gltf_mode()
            }]
        }))
    }

    /// Serialize the JSON chunk and assemble the final GLB bytes
    fn finish(mut self, mut document: Value) -> Result<Vec<u8>, String> {
        let padding = (4 - (self.bin.len() % 4)) % 4;
        self.bin.extend(std::iter::repeat_n(0u8, padding));

        document["bufferViews"] = Value::Array(self.views);
        document["accessors"] = Value::Array(self.accessors);
        document["buffers"] = json!([{ "byteLength": self.bin.len() }]);

        let json_string = serde_json::to_string(&document)
            .map_err(|e| format!("Failed to serialize glTF: {}", e))?;
        let json_bytes = json_string.as_bytes();
        let json_padding = (4 - (json_bytes.len() % 4)) % 4;
        let padded_json_len = json_bytes.len() + json_padding;

        let total_length = 12 + 8 + padded_json_len + 8 + self.bin.len();
        let mut glb: Vec<u8> = Vec::with_capacity(total_length);

        // Header
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total_length as u32).to_le_bytes());

        // JSON chunk, space padded
        glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
        glb.extend_from_slice(json_bytes);
        glb.extend(std::iter::repeat_n(0x20u8, json_padding));

        // Binary chunk, zero padded
        glb.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
        glb.extend_from_slice(&self.bin);

        Ok(glb)
    }
}

/// Encode the captured RGBA image as JPEG for embedding in the GLB
fn encode_texture_jpeg(image: &CapturedImage, quality: u8) -> Result<Vec<u8>, String> {
    use image::{ImageBuffer, Rgba};

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(image.width, image.height, image.rgba.clone())
            .ok_or("Failed to create image buffer")?;
    let rgb_img = image::DynamicImage::ImageRgba8(img).into_rgb8();

    let mut jpeg_data = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_data, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(|e| format!("Failed to encode JPEG: {}", e))?;

    debug!(
        jpeg_size = jpeg_data.len(),
        original_size = image.rgba.len(),
        "Encoded texture as JPEG"
    );

    Ok(jpeg_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraModel;
    use crate::geometry::{AnchorGeometry, FaceBuffer, MeshAnchor};
    use crate::pipelines::mesh::MeshAssembler;
    use glam::{Mat4, UVec2, Vec3};

    fn scene(need_texture: bool) -> SceneModel {
        let geometry = AnchorGeometry::from_positions(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[Vec3::Z; 3],
            FaceBuffer::triangles_u32(&[0, 1, 2]),
        )
        .unwrap();
        let camera = CameraModel::from_focal(
            500.0,
            500.0,
            32.0,
            24.0,
            UVec2::new(64, 48),
            Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)),
        );
        MeshAssembler::new(need_texture)
            .assemble_scene(&[MeshAnchor::new(Mat4::IDENTITY, geometry)], Some(&camera))
            .unwrap()
    }

    fn read_json_chunk(glb: &[u8]) -> Value {
        let json_len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
        serde_json::from_slice(&glb[20..20 + json_len]).unwrap()
    }

    #[test]
    fn test_untextured_export() {
        let path = std::env::temp_dir().join(format!("lidar_mesh_{}.glb", uuid::Uuid::new_v4()));
        export_scene_glb(&scene(false), None, 92, &path).unwrap();

        let glb = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(
            u32::from_le_bytes([glb[8], glb[9], glb[10], glb[11]]) as usize,
            glb.len()
        );

        let doc = read_json_chunk(&glb);
        let primitive = &doc["meshes"][0]["primitives"][0];
        assert_eq!(primitive["mode"], 4);
        assert!(primitive["attributes"].get("TEXCOORD_0").is_none());
        assert!(doc.get("images").is_none());
        assert_eq!(doc["accessors"][0]["max"], json!([1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_textured_export_embeds_image() {
        let image = CapturedImage {
            width: 64,
            height: 48,
            rgba: vec![128; 64 * 48 * 4],
        };
        let path = std::env::temp_dir().join(format!("lidar_mesh_{}.glb", uuid::Uuid::new_v4()));
        export_scene_glb(&scene(true), Some(&image), 80, &path).unwrap();

        let glb = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let doc = read_json_chunk(&glb);
        assert!(doc["meshes"][0]["primitives"][0]["attributes"]
            .get("TEXCOORD_0")
            .is_some());
        assert_eq!(doc["images"][0]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_empty_scene_is_rejected() {
        let path = std::env::temp_dir().join("lidar_mesh_empty.glb");
        assert!(export_scene_glb(&SceneModel::default(), None, 92, &path).is_err());
    }
}
