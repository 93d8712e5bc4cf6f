// SPDX-License-Identifier: GPL-3.0-only

//! Depth planes and diagnostic depth metrics
//!
//! - [`DepthFrame`]: borrowed row-major plane of f32 distances
//! - [`DepthMap`]: owned plane carried inside capture frames
//! - [`DepthMetricsSampler`]: fixed-grid copy plus five point samples
//! - [`MetricsPublisher`]: latest-value-wins hand-off to a display

mod publisher;
mod sampler;

pub use publisher::MetricsPublisher;
pub use sampler::{DepthMetrics, DepthMetricsSampler, SamplerState};

use crate::errors::DepthError;
use serde::{Deserialize, Serialize};

/// Borrowed depth plane, valid for the duration of one frame callback
///
/// Row-major, y increasing downward: sample (x, y) is `data[y * width + x]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthFrame<'a> {
    width: usize,
    height: usize,
    data: &'a [f32],
}

impl<'a> DepthFrame<'a> {
    /// Wrap a plane, checking it holds at least `width * height` samples
    pub fn new(width: usize, height: usize, data: &'a [f32]) -> Result<Self, DepthError> {
        let required = width.checked_mul(height);
        if required.is_none_or(|required| data.len() < required) {
            return Err(DepthError::BufferTooSmall {
                width,
                height,
                capacity: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample at (x, y), None outside the frame
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// One row of samples
    pub fn row(&self, y: usize) -> &'a [f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

/// Owned depth plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl DepthMap {
    pub fn as_frame(&self) -> Result<DepthFrame<'_>, DepthError> {
        DepthFrame::new(self.width, self.height, &self.data)
    }

    /// Decode little-endian f32 samples
    pub fn from_le_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, DepthError> {
        let data: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let map = Self {
            width,
            height,
            data,
        };
        map.as_frame()?;
        Ok(map)
    }
}
