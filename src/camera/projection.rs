// SPDX-License-Identifier: GPL-3.0-only

//! Per-vertex texture coordinates projected from the capture camera

use super::{CameraModel, Orientation};
use crate::errors::ReconstructionError;
use crate::geometry::{RawBufferView, world_position};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalized texture coordinate of one vertex
///
/// `u` runs along the native image width and `v` along its height. The
/// emitted texture-space pair is `[v, u]` (see [`TextureCoordinate::to_array`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextureCoordinate {
    pub u: f32,
    pub v: f32,
}

impl TextureCoordinate {
    /// Coordinate pair in the order written to texture buffers: `[v, u]`
    pub fn to_array(self) -> [f32; 2] {
        [self.v, self.u]
    }
}

/// Projects anchor vertices into the captured color image
///
/// The display is fixed to portrait: points are projected into a viewport
/// with width and height swapped relative to the image resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureProjector;

impl TextureProjector {
    pub fn new() -> Self {
        Self
    }

    /// One texture coordinate per local-space vertex
    ///
    /// World positions are re-derived from `anchor_transform`, so this does
    /// not depend on the vertices having been transformed already. `camera`
    /// must belong to the frame whose image the coordinates will sample.
    pub fn project_texture_coordinates<B: AsRef<[u8]>>(
        &self,
        vertices: &RawBufferView<B>,
        anchor_transform: &Mat4,
        camera: &CameraModel,
    ) -> Result<Vec<TextureCoordinate>, ReconstructionError> {
        if vertices.is_empty() {
            return Err(ReconstructionError::NoGeometry);
        }

        let size = camera.resolution();
        let viewport = Orientation::Portrait.oriented_size(size);

        let coordinates = (0..vertices.len())
            .map(|i| -> Result<TextureCoordinate, ReconstructionError> {
                let world = world_position(vertices.read(i)?, anchor_transform);
                let point = camera.project_point(world, Orientation::Portrait, viewport);
                Ok(TextureCoordinate {
                    u: point.y / size.x,
                    v: 1.0 - point.x / size.y,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = coordinates.len(), "Projected texture coordinates");
        Ok(coordinates)
    }
}
