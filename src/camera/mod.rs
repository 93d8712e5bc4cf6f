// SPDX-License-Identifier: GPL-3.0-only

//! Camera model for projecting world points into the captured image
//!
//! Conventions follow the capture backend:
//! - `transform` is camera-to-world; in camera space the camera looks down
//!   -Z with +Y up and +X to the right
//! - `intrinsics` is column-major: fx at (0,0), fy at (1,1), principal point
//!   in the third column
//! - image pixels are in the sensor's native landscape frame, origin top-left,
//!   y increasing downward

mod projection;

pub use projection::{TextureCoordinate, TextureProjector};

use glam::{Mat3, Mat4, UVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Interface orientation a projected point is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Native sensor orientation
    #[default]
    LandscapeRight,
    /// Native image rotated 90 degrees clockwise
    Portrait,
    /// Native image rotated 180 degrees
    LandscapeLeft,
    /// Native image rotated 90 degrees counter-clockwise
    PortraitUpsideDown,
}

impl Orientation {
    /// Size of the image once rotated into this orientation
    pub fn oriented_size(self, resolution: Vec2) -> Vec2 {
        match self {
            Orientation::LandscapeRight | Orientation::LandscapeLeft => resolution,
            Orientation::Portrait | Orientation::PortraitUpsideDown => {
                Vec2::new(resolution.y, resolution.x)
            }
        }
    }

    /// Map a native image point into this orientation's frame
    fn rotate(self, point: Vec2, resolution: Vec2) -> Vec2 {
        match self {
            Orientation::LandscapeRight => point,
            Orientation::Portrait => Vec2::new(resolution.y - point.y, point.x),
            Orientation::LandscapeLeft => resolution - point,
            Orientation::PortraitUpsideDown => Vec2::new(point.y, resolution.x - point.x),
        }
    }
}

/// Intrinsics, resolution and pose of the camera that captured a frame
///
/// Read-only for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub intrinsics: Mat3,
    /// Captured image size in pixels (width, height)
    pub image_resolution: UVec2,
    /// Camera-to-world transform at capture time
    pub transform: Mat4,
}

impl CameraModel {
    pub fn new(intrinsics: Mat3, image_resolution: UVec2, transform: Mat4) -> Self {
        Self {
            intrinsics,
            image_resolution,
            transform,
        }
    }

    /// Build from focal lengths and principal point in pixels
    pub fn from_focal(
        fx: f32,
        fy: f32,
        cx: f32,
        cy: f32,
        image_resolution: UVec2,
        transform: Mat4,
    ) -> Self {
        let intrinsics = Mat3::from_cols(
            Vec3::new(fx, 0.0, 0.0),
            Vec3::new(0.0, fy, 0.0),
            Vec3::new(cx, cy, 1.0),
        );
        Self::new(intrinsics, image_resolution, transform)
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.inverse()
    }

    pub fn resolution(&self) -> Vec2 {
        self.image_resolution.as_vec2()
    }

    /// Project a world point into native image pixels
    ///
    /// Points on the camera plane (z = 0) project to infinity.
    pub fn project_to_image(&self, world: Vec3) -> Vec2 {
        let camera = self.view_matrix().transform_point3(world);
        let depth = -camera.z;
        // Camera +Y is up, image +y is down
        let normalized = Vec3::new(camera.x / depth, -camera.y / depth, 1.0);
        (self.intrinsics * normalized).truncate()
    }

    /// Project a world point into a viewport shown in `orientation`
    ///
    /// The native image is rotated into `orientation` and then scaled to
    /// `viewport` independently per axis.
    pub fn project_point(&self, world: Vec3, orientation: Orientation, viewport: Vec2) -> Vec2 {
        let resolution = self.resolution();
        let oriented = orientation.rotate(self.project_to_image(world), resolution);
        oriented * viewport / orientation.oriented_size(resolution)
    }
}
