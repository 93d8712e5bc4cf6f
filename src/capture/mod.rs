// SPDX-License-Identifier: GPL-3.0-only

//! Capture-side plumbing
//!
//! The capture backend (session lifecycle, sensor configuration) lives
//! outside this crate. It pushes one [`CaptureFrame`] at a time into a
//! [`CaptureProvider`], either directly or through a [`FrameLoop`].

mod frame_loop;
mod provider;
mod record;

pub use frame_loop::{FrameLoop, FrameSender, LoopAction, frame_channel};
pub use provider::{CaptureProvider, PipelineContext};
pub use record::{AnchorRecord, CameraRecord, CaptureRecord};

use crate::camera::CameraModel;
use crate::depth::DepthMap;
use crate::geometry::MeshAnchor;

/// Captured color image, the texture target for projected coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row-major
    pub rgba: Vec<u8>,
}

impl CapturedImage {
    /// Load an image file and convert it to RGBA8
    pub fn open(path: &std::path::Path) -> Result<Self, String> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to open image {}: {}", path.display(), e))?
            .into_rgba8();
        Ok(Self {
            width: img.width(),
            height: img.height(),
            rgba: img.into_raw(),
        })
    }
}

/// Everything the capture backend delivers for one frame
#[derive(Debug, Clone, Default)]
pub struct CaptureFrame {
    pub depth: Option<DepthMap>,
    pub anchors: Vec<MeshAnchor>,
    pub camera: Option<CameraModel>,
    pub image: Option<CapturedImage>,
}
