// SPDX-License-Identifier: GPL-3.0-only

//! Frame consumer: keeps the last frame, samples metrics, builds models

use super::CaptureFrame;
use crate::config::Config;
use crate::depth::{DepthMetrics, DepthMetricsSampler, MetricsPublisher, SamplerState};
use crate::errors::ReconstructionError;
use crate::pipelines::mesh::{MeshAssembler, SceneModel};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Shared state created once at application setup
///
/// Everything that needs configuration or the metrics hand-off receives it
/// from here instead of reaching for a process-wide global.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub config: Config,
    pub metrics: MetricsPublisher,
}

impl PipelineContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: MetricsPublisher::new(),
        }
    }
}

/// Consumer of capture frames
///
/// Expects non-overlapping calls: the capture backend delivers one frame at
/// a time, and a [`super::FrameLoop`] guarantees the same across threads.
#[derive(Debug)]
pub struct CaptureProvider {
    assembler: MeshAssembler,
    sampler: DepthMetricsSampler,
    publisher: MetricsPublisher,
    last_frame: Option<CaptureFrame>,
}

impl CaptureProvider {
    pub fn new(context: &PipelineContext) -> Self {
        let mut sampler = DepthMetricsSampler::new();
        if context.config.capture_metrics_on_start {
            sampler.start_capturing();
        }
        let publisher = context.metrics.clone();
        publisher.publish(sampler.metrics());

        Self {
            assembler: MeshAssembler::new(context.config.need_texture),
            sampler,
            publisher,
            last_frame: None,
        }
    }

    /// Store `frame` as the latest and, while capturing, refresh the metrics
    pub fn on_new_frame(&mut self, frame: CaptureFrame) {
        if self.sampler.is_capturing() {
            match frame.depth.as_ref().map(|depth| depth.as_frame()) {
                Some(Ok(depth)) => {
                    if let Some(metrics) = self.sampler.process(&depth) {
                        self.publisher.publish(metrics);
                    }
                }
                Some(Err(e)) => warn!(error = %e, "Dropping malformed depth map"),
                None => debug!("Frame has no depth map"),
            }
        }
        self.last_frame = Some(frame);
    }

    /// Toggle metrics sampling, publishing the new capturing flag
    pub fn switch_capture_metrics(&mut self) -> SamplerState {
        let state = self.sampler.toggle();
        self.publisher.publish(self.sampler.metrics());
        state
    }

    pub fn sampler_state(&self) -> SamplerState {
        self.sampler.state()
    }

    pub fn metrics(&self) -> DepthMetrics {
        self.sampler.metrics()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<DepthMetrics> {
        self.publisher.subscribe()
    }

    pub fn last_frame(&self) -> Option<&CaptureFrame> {
        self.last_frame.as_ref()
    }

    /// Reconstruct the last frame's anchors into a scene model
    ///
    /// When a texture is configured but the frame carries no camera model,
    /// the model is built untextured instead of failing.
    pub fn create_model(&self) -> Result<SceneModel, ReconstructionError> {
        let Some(frame) = self.last_frame.as_ref() else {
            return Err(ReconstructionError::NoAnchors);
        };

        match self
            .assembler
            .assemble_scene(&frame.anchors, frame.camera.as_ref())
        {
            Err(ReconstructionError::MissingCameraModel) => {
                warn!("No camera model for this frame, building untextured model");
                MeshAssembler::new(false).assemble_scene(&frame.anchors, None)
            }
            result => result,
        }
    }
}
