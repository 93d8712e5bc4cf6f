// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`mesh`]: anchor geometry to world-space scene model, plus GLB export

pub mod mesh;
