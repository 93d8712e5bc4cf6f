// SPDX-License-Identifier: GPL-3.0-only

//! lidar-mesh - mesh reconstruction and depth metrics for depth cameras
//!
//! Turns the mesh anchors of a depth-sensing capture session into one
//! world-space scene model, optionally textured from the captured color
//! image, and samples a handful of diagnostic depth values from the raw
//! depth map.
//!
//! # Architecture
//!
//! - [`geometry`]: strided raw vertex buffers, anchors, world transforms
//! - [`camera`]: camera model and texture coordinate projection
//! - [`pipelines`]: mesh assembly into a [`pipelines::mesh::SceneModel`] and GLB export
//! - [`depth`]: depth frames, metrics sampler and publisher
//! - [`capture`]: frame delivery, the capture provider and JSON capture records
//! - [`config`]: user configuration handling

pub mod camera;
pub mod capture;
pub mod config;
pub mod constants;
pub mod depth;
pub mod errors;
pub mod geometry;
pub mod pipelines;

// Re-export commonly used types
pub use capture::{CaptureFrame, CaptureProvider, PipelineContext};
pub use config::Config;
pub use depth::{DepthMetrics, DepthMetricsSampler};
pub use errors::{AppError, AppResult, DepthError, ReconstructionError};
pub use pipelines::mesh::{MeshAssembler, RenderableMesh, SceneModel};
