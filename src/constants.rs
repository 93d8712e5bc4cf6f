// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Depth sampling grid dimensions
///
/// The metrics sampler copies every depth frame into a grid of this fixed
/// size. Frames larger than the grid are rejected, never resized.
pub mod depth_grid {
    /// Grid width in samples (native LiDAR depth width)
    pub const WIDTH: usize = 256;
    /// Grid height in samples (native LiDAR depth height)
    pub const HEIGHT: usize = 192;
    /// Value of a cell that no frame has written yet
    pub const UNSET: f32 = -1.0;
}

/// Vertex and index layout constants
pub mod layout {
    /// Size of one f32 component in bytes
    pub const FLOAT_SIZE: usize = 4;
    /// Size of a packed three-component f32 element
    pub const FLOAT3_SIZE: usize = 3 * FLOAT_SIZE;
    /// Raw primitive code for line faces
    pub const PRIMITIVE_LINE: u32 = 0;
    /// Raw primitive code for triangle faces
    pub const PRIMITIVE_TRIANGLE: u32 = 1;
}

/// Placeholder material assigned to every submesh
pub mod material {
    /// Material name written into exported scenes
    pub const PLACEHOLDER_NAME: &str = "anchor_placeholder";
    /// Opaque light grey base color (linear RGBA)
    pub const PLACEHOLDER_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
}

/// Scene export settings
pub mod export {
    /// JPEG quality used when embedding the captured image as texture
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;
    /// Generator string stored in exported glTF assets
    pub const GENERATOR: &str = "lidar-mesh";
}

/// Default tracing filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Directory name used below the platform config directory
    pub const CONFIG_DIR_NAME: &str = "lidar-mesh";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_center_is_inside_grid() {
        assert!(depth_grid::WIDTH / 2 - 1 < depth_grid::WIDTH);
        assert!(depth_grid::HEIGHT / 2 - 1 < depth_grid::HEIGHT);
        assert_eq!(depth_grid::WIDTH * depth_grid::HEIGHT, 49_152);
    }
}
