// SPDX-License-Identifier: GPL-3.0-only

//! Depth metrics sampler
//!
//! Copies each depth frame into a fixed 256x192 grid and reads five fixed
//! coordinates out of it. The coordinate-to-name mapping is kept exactly as
//! the capture app has always reported it:
//!
//! | metric              | grid cell          |
//! |---------------------|--------------------|
//! | bottom_left_corner  | (0, 0)             |
//! | bottom_right_corner | (w-1, 0)           |
//! | center              | (w/2-1, h/2-1)     |
//! | top_left_corner     | (0, h-1)           |
//! | top_right_corner    | (w-1, 0)           |
//!
//! Both right corners read the same cell, and "bottom" is row 0 even though
//! depth rows grow downward. Consumers depend on these values as reported,
//! so they are not remapped here.

use super::DepthFrame;
use crate::constants::depth_grid;
use crate::errors::DepthError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Whether frames are being sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplerState {
    #[default]
    Idle,
    Capturing,
}

/// Five named depth samples plus the capturing flag
///
/// Samples are None until the first successful update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DepthMetrics {
    pub top_left_corner: Option<f32>,
    pub top_right_corner: Option<f32>,
    pub center: Option<f32>,
    pub bottom_left_corner: Option<f32>,
    pub bottom_right_corner: Option<f32>,
    pub capturing: bool,
}

/// Fixed-grid depth sampler
///
/// `update_offsets` and `update_metrics` both take `&mut self`, so a metrics
/// read can never observe a grid that is half overwritten.
#[derive(Debug, Clone)]
pub struct DepthMetricsSampler {
    /// Column-major: cell (x, y) lives at `x * HEIGHT + y`
    grid: Vec<f32>,
    /// Extent written by the most recent frame
    filled: (usize, usize),
    state: SamplerState,
    metrics: DepthMetrics,
}

impl Default for DepthMetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthMetricsSampler {
    pub fn new() -> Self {
        Self {
            grid: vec![depth_grid::UNSET; depth_grid::WIDTH * depth_grid::HEIGHT],
            filled: (0, 0),
            state: SamplerState::Idle,
            metrics: DepthMetrics::default(),
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SamplerState::Capturing
    }

    pub fn start_capturing(&mut self) {
        self.set_state(SamplerState::Capturing);
    }

    pub fn stop_capturing(&mut self) {
        self.set_state(SamplerState::Idle);
    }

    /// Flip between Idle and Capturing, returning the new state
    pub fn toggle(&mut self) -> SamplerState {
        let next = match self.state {
            SamplerState::Idle => SamplerState::Capturing,
            SamplerState::Capturing => SamplerState::Idle,
        };
        self.set_state(next);
        next
    }

    fn set_state(&mut self, state: SamplerState) {
        if self.state != state {
            info!(from = ?self.state, to = ?state, "Depth metrics sampler state changed");
        }
        self.state = state;
        self.metrics.capturing = state == SamplerState::Capturing;
    }

    /// Latest published metrics
    pub fn metrics(&self) -> DepthMetrics {
        self.metrics
    }

    /// Grid value at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Result<f32, DepthError> {
        if x >= depth_grid::WIDTH || y >= depth_grid::HEIGHT {
            return Err(DepthError::IndexOutOfRange {
                x,
                y,
                width: depth_grid::WIDTH,
                height: depth_grid::HEIGHT,
            });
        }
        Ok(self.grid[x * depth_grid::HEIGHT + y])
    }

    /// Copy the whole depth plane into the grid
    pub fn update_offsets(&mut self, frame: &DepthFrame<'_>) -> Result<(), DepthError> {
        let (width, height) = (frame.width(), frame.height());
        if width > depth_grid::WIDTH || height > depth_grid::HEIGHT {
            return Err(DepthError::BufferTooSmall {
                width,
                height,
                capacity: depth_grid::WIDTH * depth_grid::HEIGHT,
            });
        }

        for y in 0..height {
            for (x, &depth) in frame.row(y).iter().enumerate() {
                self.grid[x * depth_grid::HEIGHT + y] = depth;
            }
        }
        self.filled = (width, height);
        Ok(())
    }

    /// Read the five fixed cells and republish them
    ///
    /// Fails without touching the published metrics if the last frame did
    /// not cover every cell.
    pub fn update_metrics(&mut self) -> Result<DepthMetrics, DepthError> {
        let right = depth_grid::WIDTH - 1;
        let top = depth_grid::HEIGHT - 1;
        let (center_x, center_y) = (depth_grid::WIDTH / 2 - 1, depth_grid::HEIGHT / 2 - 1);

        let bottom_left = self.sample_filled(0, 0)?;
        let bottom_right = self.sample_filled(right, 0)?;
        let center = self.sample_filled(center_x, center_y)?;
        let top_left = self.sample_filled(0, top)?;
        let top_right = self.sample_filled(right, 0)?;

        self.metrics = DepthMetrics {
            top_left_corner: Some(top_left),
            top_right_corner: Some(top_right),
            center: Some(center),
            bottom_left_corner: Some(bottom_left),
            bottom_right_corner: Some(bottom_right),
            capturing: self.is_capturing(),
        };
        Ok(self.metrics)
    }

    fn sample_filled(&self, x: usize, y: usize) -> Result<f32, DepthError> {
        let (width, height) = self.filled;
        if x >= width || y >= height {
            return Err(DepthError::IndexOutOfRange {
                x,
                y,
                width,
                height,
            });
        }
        self.get(x, y)
    }

    /// Run one update cycle if capturing
    ///
    /// Returns the new metrics, or None when idle or when the frame was
    /// dropped. A dropped frame leaves the previous metrics in place.
    pub fn process(&mut self, frame: &DepthFrame<'_>) -> Option<DepthMetrics> {
        if !self.is_capturing() {
            return None;
        }
        match self.update_offsets(frame).and_then(|()| self.update_metrics()) {
            Ok(metrics) => {
                debug!(center = ?metrics.center, "Depth metrics updated");
                Some(metrics)
            }
            Err(e) => {
                warn!(error = %e, "Dropping depth frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Vec<f32> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push((x + y * 1000) as f32);
            }
        }
        data
    }

    #[test]
    fn test_ramp_metrics() {
        let data = ramp(depth_grid::WIDTH, depth_grid::HEIGHT);
        let frame = DepthFrame::new(depth_grid::WIDTH, depth_grid::HEIGHT, &data).unwrap();
        let mut sampler = DepthMetricsSampler::new();
        sampler.update_offsets(&frame).unwrap();
        let metrics = sampler.update_metrics().unwrap();

        assert_eq!(metrics.bottom_left_corner, Some(0.0));
        assert_eq!(metrics.top_left_corner, Some(191_000.0));
        assert_eq!(metrics.center, Some((127 + 95 * 1000) as f32));
        assert_eq!(metrics.top_right_corner, metrics.bottom_right_corner);
        assert_eq!(metrics.top_right_corner, Some(255.0));
    }

    #[test]
    fn test_oversized_frame() {
        let data = vec![0.0; 257 * 192];
        let frame = DepthFrame::new(257, 192, &data).unwrap();
        let mut sampler = DepthMetricsSampler::new();
        assert!(matches!(
            sampler.update_offsets(&frame),
            Err(DepthError::BufferTooSmall { width: 257, .. })
        ));
    }

    #[test]
    fn test_small_frame_cannot_be_sampled() {
        let data = ramp(128, 96);
        let frame = DepthFrame::new(128, 96, &data).unwrap();
        let mut sampler = DepthMetricsSampler::new();
        sampler.update_offsets(&frame).unwrap();
        assert_eq!(
            sampler.update_metrics(),
            Err(DepthError::IndexOutOfRange {
                x: 255,
                y: 0,
                width: 128,
                height: 96
            })
        );
        assert_eq!(sampler.get(10, 5), Ok(5010.0));
    }

    #[test]
    fn test_idle_sampler_skips_frames() {
        let data = ramp(depth_grid::WIDTH, depth_grid::HEIGHT);
        let frame = DepthFrame::new(depth_grid::WIDTH, depth_grid::HEIGHT, &data).unwrap();
        let mut sampler = DepthMetricsSampler::new();
        assert_eq!(sampler.process(&frame), None);
        assert_eq!(sampler.metrics(), DepthMetrics::default());
        assert_eq!(sampler.get(1, 1), Ok(depth_grid::UNSET));
    }

    #[test]
    fn test_bad_frame_keeps_previous_metrics() {
        let data = ramp(depth_grid::WIDTH, depth_grid::HEIGHT);
        let frame = DepthFrame::new(depth_grid::WIDTH, depth_grid::HEIGHT, &data).unwrap();
        let mut sampler = DepthMetricsSampler::new();
        assert_eq!(sampler.toggle(), SamplerState::Capturing);
        let first = sampler.process(&frame).unwrap();
        assert!(first.capturing);

        let small = vec![9.0; 16];
        let small_frame = DepthFrame::new(4, 4, &small).unwrap();
        assert_eq!(sampler.process(&small_frame), None);
        assert_eq!(sampler.metrics(), first);
    }

    #[test]
    fn test_toggle_updates_flag() {
        let mut sampler = DepthMetricsSampler::new();
        sampler.start_capturing();
        assert!(sampler.metrics().capturing);
        assert_eq!(sampler.toggle(), SamplerState::Idle);
        assert!(!sampler.metrics().capturing);
    }
}
