// SPDX-License-Identifier: GPL-3.0-only

//! Anchor-local to world-space vertex transformation

use super::RawBufferView;
use crate::errors::ReconstructionError;
use glam::{Mat4, Vec3};

/// Transform a local position into world space
///
/// The position is a homogeneous point (w = 1) so the translation column
/// applies. No perspective divide: anchor transforms are affine.
pub fn world_position(local: Vec3, anchor_transform: &Mat4) -> Vec3 {
    (*anchor_transform * local.extend(1.0)).truncate()
}

/// Rewrite every vertex of `vertices` in place as world-space coordinates
///
/// Only the first three components of each element are written; bytes the
/// stride reserves past them survive unchanged. An empty buffer is a no-op.
pub fn transform_to_world<B>(
    vertices: &mut RawBufferView<B>,
    anchor_transform: &Mat4,
) -> Result<(), ReconstructionError>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    for index in 0..vertices.len() {
        let local = vertices.read(index)?;
        vertices.write(index, world_position(local, anchor_transform))?;
    }
    Ok(())
}
