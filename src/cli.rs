// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Reconstructing a recorded capture frame into a GLB scene
//! - Printing depth metrics for a recorded depth map

use chrono::Local;
use lidar_mesh::capture::{CaptureProvider, CaptureRecord, CapturedImage, PipelineContext};
use lidar_mesh::pipelines::mesh::export_scene_glb_async;
use lidar_mesh::{AppError, Config};
use std::path::{Path, PathBuf};

/// Reconstruct a capture record and export it as GLB
pub fn reconstruct(
    mut config: Config,
    input: &Path,
    output: Option<PathBuf>,
    texture: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame = CaptureRecord::load(input)?.into_frame()?;
    if let Some(path) = texture {
        frame.image = Some(CapturedImage::open(&path).map_err(AppError::Other)?);
        config.need_texture = true;
    }
    let image = frame.image.clone();
    let anchor_count = frame.anchors.len();

    let output_path = match output {
        Some(path) => path,
        None => {
            let dir = config.export_dir();
            std::fs::create_dir_all(&dir)?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            dir.join(format!("scene_{}.glb", timestamp))
        }
    };
    let jpeg_quality = config.jpeg_quality;

    let context = PipelineContext::new(config);
    let mut provider = CaptureProvider::new(&context);
    provider.on_new_frame(frame);
    let scene = provider.create_model().map_err(AppError::from)?;
    let textured = scene.iter().any(|mesh| mesh.has_texture_coordinates());
    let vertex_count = scene.vertex_count();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(export_scene_glb_async(
            scene,
            image,
            jpeg_quality,
            output_path.clone(),
        ))
        .map_err(AppError::Export)?;

    println!("Reconstructed {} anchors ({} vertices)", anchor_count, vertex_count);
    if textured {
        println!("Texture coordinates projected from the capture camera");
    }
    println!("Scene saved to: {}", output_path.display());
    Ok(())
}

/// Print the depth metrics of a capture record as JSON
pub fn print_metrics(mut config: Config, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let frame = CaptureRecord::load(input)?.into_frame()?;
    let Some(depth) = frame.depth.as_ref() else {
        return Err(AppError::Other("Capture record has no depth map".to_string()).into());
    };
    // Surface frame problems here instead of silently keeping stale metrics
    depth.as_frame().map_err(AppError::from)?;

    config.capture_metrics_on_start = true;
    let context = PipelineContext::new(config);
    let mut provider = CaptureProvider::new(&context);
    provider.on_new_frame(frame);

    let metrics = provider.metrics();
    if metrics.center.is_none() {
        return Err(AppError::Other(
            "Depth map could not be sampled (see log for details)".to_string(),
        )
        .into());
    }
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
