// SPDX-License-Identifier: GPL-3.0-only

//! Error types for reconstruction, depth sampling and the surrounding tooling

use crate::geometry::VertexFormat;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Mesh reconstruction errors
    Reconstruction(ReconstructionError),
    /// Depth metric sampling errors
    Depth(DepthError),
    /// Configuration errors
    Config(String),
    /// Scene export errors
    Export(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while turning anchors into a scene model.
///
/// All of these abort the current reconstruction call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructionError {
    /// Element index exceeds the element count of a buffer view
    OutOfBounds { index: usize, count: usize },
    /// Buffer layout does not fit the backing bytes
    InvalidLayout(String),
    /// Component layout other than three packed f32
    UnsupportedFormat(VertexFormat),
    /// Index width other than 1, 2 or 4 bytes
    UnsupportedIndexWidth(usize),
    /// Face primitive code outside {line, triangle}
    UnknownPrimitiveType(u32),
    /// Texture coordinates requested without a camera model
    MissingCameraModel,
    /// No vertices to project
    NoGeometry,
    /// Reconstruction requested with an empty anchor set
    NoAnchors,
    /// Vertex and normal buffers disagree on element count
    NormalCountMismatch { vertices: usize, normals: usize },
    /// A face references a vertex that does not exist
    FaceIndexOutOfRange { index: u32, vertex_count: usize },
}

/// Errors local to one depth sampling cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepthError {
    /// Frame does not fit the sampling grid, or its plane is shorter than advertised
    BufferTooSmall {
        width: usize,
        height: usize,
        capacity: usize,
    },
    /// A fixed sample coordinate is not covered by the last frame
    IndexOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Reconstruction(e) => write!(f, "Reconstruction error: {}", e),
            AppError::Depth(e) => write!(f, "Depth error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Export(msg) => write!(f, "Export error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ReconstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconstructionError::OutOfBounds { index, count } => {
                write!(f, "Index {} out of bounds for {} elements", index, count)
            }
            ReconstructionError::InvalidLayout(msg) => write!(f, "Invalid buffer layout: {}", msg),
            ReconstructionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported vertex format: {:?}", format)
            }
            ReconstructionError::UnsupportedIndexWidth(bytes) => {
                write!(f, "Unsupported index width: {} bytes", bytes)
            }
            ReconstructionError::UnknownPrimitiveType(code) => {
                write!(f, "Unknown primitive type: {}", code)
            }
            ReconstructionError::MissingCameraModel => {
                write!(f, "Texture requested without a camera model")
            }
            ReconstructionError::NoGeometry => write!(f, "No vertices to project"),
            ReconstructionError::NoAnchors => write!(f, "No anchors to reconstruct"),
            ReconstructionError::NormalCountMismatch { vertices, normals } => write!(
                f,
                "Vertex count {} does not match normal count {}",
                vertices, normals
            ),
            ReconstructionError::FaceIndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Face index {} out of range for {} vertices",
                index, vertex_count
            ),
        }
    }
}

impl fmt::Display for DepthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthError::BufferTooSmall {
                width,
                height,
                capacity,
            } => write!(
                f,
                "Depth frame {}x{} does not fit buffer of {} samples",
                width, height, capacity
            ),
            DepthError::IndexOutOfRange {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Sample ({}, {}) outside depth frame {}x{}",
                x, y, width, height
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ReconstructionError {}
impl std::error::Error for DepthError {}

impl From<ReconstructionError> for AppError {
    fn from(err: ReconstructionError) -> Self {
        AppError::Reconstruction(err)
    }
}

impl From<DepthError> for AppError {
    fn from(err: DepthError) -> Self {
        AppError::Depth(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ReconstructionError::OutOfBounds { index: 4, count: 4 };
        assert_eq!(err.to_string(), "Index 4 out of bounds for 4 elements");

        let app: AppError = ReconstructionError::NoAnchors.into();
        assert_eq!(
            app.to_string(),
            "Reconstruction error: No anchors to reconstruct"
        );

        let depth: AppError = DepthError::IndexOutOfRange {
            x: 255,
            y: 0,
            width: 128,
            height: 96,
        }
        .into();
        assert!(depth.to_string().starts_with("Depth error: Sample (255, 0)"));
    }
}
