// SPDX-License-Identifier: GPL-3.0-only

//! Anchor geometry and raw vertex buffer access
//!
//! - [`buffer_view`]: strided, bounds-checked access to packed vertex bytes
//! - [`transform`]: anchor-local to world-space rewriting
//! - [`anchor`]: mesh anchors and their owned geometry

mod anchor;
mod buffer_view;
mod transform;

pub use anchor::{AnchorGeometry, FaceBuffer, MeshAnchor};
pub use buffer_view::{BufferLayout, RawBufferView, VertexFormat};
pub use transform::{transform_to_world, world_position};
