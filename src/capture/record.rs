// SPDX-License-Identifier: GPL-3.0-only

//! JSON capture records
//!
//! A serialized snapshot of one capture frame, used to replay captures
//! from the command line. Matrices are column-major, as delivered by the
//! capture backend.

use super::CaptureFrame;
use crate::camera::CameraModel;
use crate::constants::layout::{PRIMITIVE_LINE, PRIMITIVE_TRIANGLE};
use crate::depth::DepthMap;
use crate::errors::{AppError, AppResult};
use crate::geometry::{AnchorGeometry, FaceBuffer, MeshAnchor};
use glam::{Mat3, Mat4, UVec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

fn default_primitive() -> u32 {
    PRIMITIVE_TRIANGLE
}

/// One anchor with packed geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub transform: [f32; 16],
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<u32>,
    /// Raw primitive code (0 = line, 1 = triangle)
    #[serde(default = "default_primitive")]
    pub primitive: u32,
}

/// Capture camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub intrinsics: [f32; 9],
    pub width: u32,
    pub height: u32,
    pub transform: [f32; 16],
}

/// One serialized capture frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureRecord {
    #[serde(default)]
    pub anchors: Vec<AnchorRecord>,
    #[serde(default)]
    pub camera: Option<CameraRecord>,
    #[serde(default)]
    pub depth: Option<DepthMap>,
}

impl AnchorRecord {
    pub fn into_anchor(self) -> AppResult<MeshAnchor> {
        let positions: Vec<Vec3> = self.vertices.iter().copied().map(Vec3::from).collect();
        let normals: Vec<Vec3> = self.normals.iter().copied().map(Vec3::from).collect();

        // Unknown codes keep the triangle stride and are rejected when the
        // index buffer is built
        let per_primitive = if self.primitive == PRIMITIVE_LINE { 2 } else { 3 };
        let faces = FaceBuffer {
            data: bytemuck::cast_slice::<u32, u8>(&self.faces).to_vec(),
            count: self.faces.len() / per_primitive,
            bytes_per_index: 4,
            index_count_per_primitive: per_primitive,
            primitive_type: self.primitive,
        };

        let geometry = AnchorGeometry::from_positions(&positions, &normals, faces)?;
        let transform = Mat4::from_cols_array(&self.transform);
        Ok(match self.id {
            Some(id) => MeshAnchor::with_id(id, transform, geometry),
            None => MeshAnchor::new(transform, geometry),
        })
    }
}

impl From<&CameraRecord> for CameraModel {
    fn from(record: &CameraRecord) -> Self {
        CameraModel::new(
            Mat3::from_cols_array(&record.intrinsics),
            UVec2::new(record.width, record.height),
            Mat4::from_cols_array(&record.transform),
        )
    }
}

impl CaptureRecord {
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let record: CaptureRecord = serde_json::from_str(&contents)
            .map_err(|e| AppError::Other(format!("Invalid capture record: {}", e)))?;
        debug!(
            path = %path.display(),
            anchors = record.anchors.len(),
            "Loaded capture record"
        );
        Ok(record)
    }

    pub fn into_frame(self) -> AppResult<CaptureFrame> {
        let camera = self.camera.as_ref().map(CameraModel::from);
        let anchors = self
            .anchors
            .into_iter()
            .map(AnchorRecord::into_anchor)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(CaptureFrame {
            depth: self.depth,
            anchors,
            camera,
            image: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "anchors": [{
            "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0,-1,1],
            "vertices": [[0,0,0],[1,0,0],[0,1,0]],
            "normals": [[0,0,1],[0,0,1],[0,0,1]],
            "faces": [0,1,2]
        }],
        "camera": {
            "intrinsics": [1000,0,0, 0,1000,0, 960,720,1],
            "width": 1920,
            "height": 1440,
            "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]
        }
    }"#;

    #[test]
    fn test_record_into_frame() {
        let record: CaptureRecord = serde_json::from_str(RECORD).unwrap();
        let frame = record.into_frame().unwrap();
        assert_eq!(frame.anchors.len(), 1);
        assert_eq!(frame.anchors[0].position(), Vec3::new(2.0, 0.0, -1.0));
        assert_eq!(frame.anchors[0].geometry.faces().count, 1);

        let camera = frame.camera.unwrap();
        assert_eq!(camera.intrinsics.z_axis, Vec3::new(960.0, 720.0, 1.0));
        assert_eq!(camera.image_resolution, UVec2::new(1920, 1440));
        assert!(frame.depth.is_none());
    }

    #[test]
    fn test_mismatched_normals_rejected() {
        let mut record: CaptureRecord = serde_json::from_str(RECORD).unwrap();
        record.anchors[0].normals.pop();
        assert!(record.into_frame().is_err());
    }
}
