// SPDX-License-Identifier: GPL-3.0-only

//! Renderer-facing buffers produced by mesh assembly

use crate::constants::layout::{PRIMITIVE_LINE, PRIMITIVE_TRIANGLE};
use crate::constants::material;
use crate::errors::ReconstructionError;
use crate::geometry::{FaceBuffer, RawBufferView};
use serde::{Deserialize, Serialize};

/// World-space vertex (or normal) bytes with their stride/offset layout
pub type VertexBuffer = RawBufferView<Vec<u8>>;

/// Primitive assembled from an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    Line,
    Triangle,
}

impl PrimitiveType {
    /// Number of indices making up one primitive
    pub fn indices_per_primitive(self) -> usize {
        match self {
            PrimitiveType::Line => 2,
            PrimitiveType::Triangle => 3,
        }
    }

    /// glTF primitive mode (LINES = 1, TRIANGLES = 4)
    pub fn gltf_mode(self) -> u32 {
        match self {
            PrimitiveType::Line => 1,
            PrimitiveType::Triangle => 4,
        }
    }
}

impl TryFrom<u32> for PrimitiveType {
    type Error = ReconstructionError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            PRIMITIVE_LINE => Ok(PrimitiveType::Line),
            PRIMITIVE_TRIANGLE => Ok(PrimitiveType::Triangle),
            other => Err(ReconstructionError::UnknownPrimitiveType(other)),
        }
    }
}

/// Width of one index in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexWidth {
    U8,
    U16,
    U32,
}

impl IndexWidth {
    pub fn from_bytes(bytes: usize) -> Result<Self, ReconstructionError> {
        match bytes {
            1 => Ok(IndexWidth::U8),
            2 => Ok(IndexWidth::U16),
            4 => Ok(IndexWidth::U32),
            other => Err(ReconstructionError::UnsupportedIndexWidth(other)),
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IndexWidth::U8 => 1,
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// Owned copy of an anchor's face indices
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuffer {
    data: Vec<u8>,
    primitive: PrimitiveType,
    primitive_count: usize,
    width: IndexWidth,
}

impl IndexBuffer {
    /// Copy the index bytes referenced by `faces`
    pub fn from_faces(faces: &FaceBuffer) -> Result<Self, ReconstructionError> {
        let primitive = PrimitiveType::try_from(faces.primitive_type)?;
        let width = IndexWidth::from_bytes(faces.bytes_per_index)?;
        if faces.index_count_per_primitive != primitive.indices_per_primitive() {
            return Err(ReconstructionError::InvalidLayout(format!(
                "{:?} faces with {} indices per primitive",
                primitive, faces.index_count_per_primitive
            )));
        }

        let Some(byte_len) = faces
            .count
            .checked_mul(faces.index_count_per_primitive)
            .and_then(|indices| indices.checked_mul(width.bytes()))
        else {
            return Err(ReconstructionError::InvalidLayout(format!(
                "{} faces overflow the index buffer size",
                faces.count
            )));
        };
        if byte_len > faces.data.len() {
            return Err(ReconstructionError::InvalidLayout(format!(
                "{} faces need {} index bytes, buffer has {}",
                faces.count,
                byte_len,
                faces.data.len()
            )));
        }

        Ok(Self {
            data: faces.data[..byte_len].to_vec(),
            primitive,
            primitive_count: faces.count,
            width,
        })
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    pub fn width(&self) -> IndexWidth {
        self.width
    }

    /// Total number of indices: primitive count times indices per primitive
    pub fn index_count(&self) -> usize {
        self.primitive_count * self.primitive.indices_per_primitive()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Index `i` widened to u32
    pub fn get(&self, i: usize) -> Option<u32> {
        let size = self.width.bytes();
        let bytes = self.data.get(i * size..(i + 1) * size)?;
        Some(match self.width {
            IndexWidth::U8 => bytes[0] as u32,
            IndexWidth::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            IndexWidth::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    /// All indices widened to u32
    pub fn to_u32(&self) -> Vec<u32> {
        (0..self.index_count()).filter_map(|i| self.get(i)).collect()
    }
}

/// Fixed placeholder material shared by every submesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub double_sided: bool,
}

impl Material {
    pub fn placeholder() -> Self {
        Self {
            name: material::PLACEHOLDER_NAME.to_string(),
            base_color: material::PLACEHOLDER_COLOR,
            double_sided: true,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// One drawable primitive group
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    pub primitive: PrimitiveType,
    pub index_count: usize,
    pub material: Material,
}
