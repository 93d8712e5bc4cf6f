// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for scene reconstruction

use glam::{Mat3, Mat4, UVec2, Vec3};
use lidar_mesh::camera::CameraModel;
use lidar_mesh::capture::{CaptureFrame, CaptureProvider, PipelineContext};
use lidar_mesh::constants::layout::PRIMITIVE_LINE;
use lidar_mesh::geometry::{AnchorGeometry, FaceBuffer, MeshAnchor};
use lidar_mesh::pipelines::mesh::{IndexWidth, PrimitiveType};
use lidar_mesh::{Config, MeshAssembler, ReconstructionError};

fn quad_anchor(transform: Mat4) -> MeshAnchor {
    let geometry = AnchorGeometry::from_positions(
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        &[Vec3::Z; 4],
        FaceBuffer::triangles_u32(&[0, 1, 2, 0, 2, 3]),
    )
    .unwrap();
    MeshAnchor::new(transform, geometry)
}

fn camera() -> CameraModel {
    CameraModel::new(
        Mat3::from_cols(
            Vec3::new(1000.0, 0.0, 0.0),
            Vec3::new(0.0, 1000.0, 0.0),
            Vec3::new(960.0, 720.0, 1.0),
        ),
        UVec2::new(1920, 1440),
        Mat4::IDENTITY,
    )
}

#[test]
fn test_quad_reconstruction() {
    let anchor = quad_anchor(Mat4::IDENTITY);
    let scene = MeshAssembler::new(false)
        .assemble_scene(std::slice::from_ref(&anchor), None)
        .unwrap();

    assert_eq!(scene.len(), 1);
    let mesh = &scene.meshes()[0];
    assert_eq!(mesh.anchor_id, anchor.id);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.indices.index_count(), 6);
    assert_eq!(mesh.indices.width(), IndexWidth::U32);
    assert_eq!(mesh.submesh.primitive, PrimitiveType::Triangle);
    assert_eq!(mesh.submesh.index_count, 6);
    assert!(!mesh.has_texture_coordinates());
    assert_eq!(mesh.indices.to_u32(), vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(mesh.vertices.read(2).unwrap(), Vec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_anchors_keep_order_and_world_positions() {
    let anchors: Vec<MeshAnchor> = (0..3)
        .map(|i| quad_anchor(Mat4::from_translation(Vec3::new(i as f32 * 10.0, 0.0, 0.0))))
        .collect();
    let scene = MeshAssembler::new(false).assemble_scene(&anchors, None).unwrap();

    assert_eq!(scene.len(), 3);
    for (i, (mesh, anchor)) in scene.iter().zip(&anchors).enumerate() {
        assert_eq!(mesh.anchor_id, anchor.id);
        assert_eq!(
            mesh.vertices.read(0).unwrap(),
            Vec3::new(i as f32 * 10.0, 0.0, 0.0)
        );
    }
    let (min, max) = scene.bounds().unwrap();
    assert_eq!(min, Vec3::ZERO);
    assert_eq!(max, Vec3::new(21.0, 1.0, 0.0));
}

#[test]
fn test_empty_anchor_list() {
    let result = MeshAssembler::new(false).assemble_scene(&[], None);
    assert_eq!(result, Err(ReconstructionError::NoAnchors));
}

#[test]
fn test_line_faces() {
    let indices: [u32; 4] = [0, 1, 1, 2];
    let faces = FaceBuffer {
        data: bytemuck::cast_slice::<u32, u8>(&indices).to_vec(),
        count: 2,
        bytes_per_index: 4,
        index_count_per_primitive: 2,
        primitive_type: PRIMITIVE_LINE,
    };
    let geometry =
        AnchorGeometry::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y], &[Vec3::Z; 3], faces)
            .unwrap();
    let anchor = MeshAnchor::new(Mat4::IDENTITY, geometry);

    let scene = MeshAssembler::new(false)
        .assemble_scene(std::slice::from_ref(&anchor), None)
        .unwrap();
    let mesh = &scene.meshes()[0];
    assert_eq!(mesh.submesh.primitive, PrimitiveType::Line);
    assert_eq!(mesh.submesh.index_count, 4);
}

#[test]
fn test_textured_scene_through_provider() {
    let config = Config {
        need_texture: true,
        ..Default::default()
    };
    let mut provider = CaptureProvider::new(&PipelineContext::new(config));
    provider.on_new_frame(CaptureFrame {
        anchors: vec![quad_anchor(Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)))],
        camera: Some(camera()),
        ..Default::default()
    });

    let scene = provider.create_model().unwrap();
    let coordinates = scene.meshes()[0].texture_coordinates.as_ref().unwrap();
    assert_eq!(coordinates.len(), 4);
    // Vertex 0 sits on the optical axis, which lands on the image center
    assert!((coordinates[0].u - 0.5).abs() < 1e-5);
    assert!((coordinates[0].v - 0.5).abs() < 1e-5);
}
