// SPDX-License-Identifier: GPL-3.0-only

//! Latest-value-wins publication of depth metrics
//!
//! The capture thread publishes, the display side subscribes. There is no
//! queue: each publish replaces the previous value, so a slow display may
//! skip intermediate updates but never holds up the capture thread.

use super::DepthMetrics;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Sender side of the metrics hand-off
#[derive(Debug, Clone)]
pub struct MetricsPublisher {
    sender: Arc<watch::Sender<DepthMetrics>>,
}

impl Default for MetricsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(DepthMetrics::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the published value; succeeds with or without subscribers
    pub fn publish(&self, metrics: DepthMetrics) {
        self.sender.send_replace(metrics);
        trace!(
            subscribers = self.sender.receiver_count(),
            "Published depth metrics"
        );
    }

    /// New display-side receiver, starting at the current value
    pub fn subscribe(&self) -> watch::Receiver<DepthMetrics> {
        self.sender.subscribe()
    }

    /// Most recently published value
    pub fn latest(&self) -> DepthMetrics {
        *self.sender.borrow()
    }
}
