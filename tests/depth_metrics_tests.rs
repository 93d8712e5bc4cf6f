// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for depth metrics sampling

use lidar_mesh::DepthMetricsSampler;
use lidar_mesh::constants::depth_grid::{HEIGHT, WIDTH};
use lidar_mesh::depth::{DepthMap, SamplerState};

/// Depth of pixel (x, y) is x + 1000 * y
fn ramp() -> DepthMap {
    let mut data = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            data.push(x as f32 + 1000.0 * y as f32);
        }
    }
    DepthMap {
        width: WIDTH,
        height: HEIGHT,
        data,
    }
}

#[test]
fn test_ramp_metrics() {
    let depth = ramp();
    let mut sampler = DepthMetricsSampler::new();
    assert_eq!(sampler.toggle(), SamplerState::Capturing);

    let metrics = sampler.process(&depth.as_frame().unwrap()).unwrap();
    assert_eq!(metrics.bottom_left_corner, Some(0.0));
    assert_eq!(metrics.bottom_right_corner, Some(255.0));
    assert_eq!(metrics.center, Some(127.0 + 95_000.0));
    assert_eq!(metrics.top_left_corner, Some(191_000.0));
    assert_eq!(metrics.top_right_corner, Some(255.0));
    assert!(metrics.capturing);
}

#[test]
fn test_idle_sampler_ignores_frames() {
    let depth = ramp();
    let mut sampler = DepthMetricsSampler::new();
    assert!(sampler.process(&depth.as_frame().unwrap()).is_none());
    assert_eq!(sampler.metrics().center, None);
}

#[test]
fn test_depth_map_from_le_bytes() {
    let values: Vec<f32> = (0..(WIDTH * HEIGHT)).map(|i| i as f32).collect();
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let depth = DepthMap::from_le_bytes(WIDTH, HEIGHT, &bytes).unwrap();
    assert_eq!(depth.as_frame().unwrap().get(3, 1), Some((WIDTH + 3) as f32));
}
