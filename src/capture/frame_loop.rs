// SPDX-License-Identifier: GPL-3.0-only
//! Frame delivery thread
//!
//! The capture backend pushes frames through a single-slot channel; a
//! dedicated thread hands them to the [`CaptureProvider`] one at a time.
//! While a frame is waiting in the slot, newer frames are dropped, so at
//! most one frame is ever in flight and the producer never blocks.

use super::{CaptureFrame, CaptureProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How long the loop waits for a frame before re-checking the stop signal
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Action returned by the per-frame callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep consuming frames
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Producer side of the single-slot frame channel
#[derive(Debug, Clone)]
pub struct FrameSender {
    sender: SyncSender<CaptureFrame>,
}

impl FrameSender {
    /// Offer a frame without blocking
    ///
    /// Returns false when the previous frame has not been picked up yet
    /// (the new frame is dropped) or when the loop has shut down.
    pub fn offer(&self, frame: CaptureFrame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("Frame slot occupied, dropping frame");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Frame loop gone, dropping frame");
                false
            }
        }
    }
}

/// Create the single-slot frame channel
pub fn frame_channel() -> (FrameSender, Receiver<CaptureFrame>) {
    let (sender, receiver) = std::sync::mpsc::sync_channel(1);
    (FrameSender { sender }, receiver)
}

/// Controller for the frame delivery thread
///
/// # Example
///
/// ```ignore
/// let (sender, receiver) = frame_channel();
/// let provider = Arc::new(Mutex::new(CaptureProvider::new(&context)));
/// let mut frame_loop = FrameLoop::start("lidar-frames", receiver, provider.clone(), |_| {
///     LoopAction::Continue
/// });
///
/// // capture backend callback
/// sender.offer(frame);
///
/// // pausing capture: frames stop, the frame being processed completes
/// frame_loop.stop();
/// ```
pub struct FrameLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl FrameLoop {
    /// Start consuming frames on a new thread
    ///
    /// Each received frame is passed to the provider, then `after_frame`
    /// runs with the provider still locked and decides whether to continue.
    /// The loop also ends when every [`FrameSender`] is dropped.
    pub fn start<F>(
        name: &str,
        receiver: Receiver<CaptureFrame>,
        provider: Arc<Mutex<CaptureProvider>>,
        mut after_frame: F,
    ) -> Self
    where
        F: FnMut(&mut CaptureProvider) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Frame loop thread started");

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                let frame = match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(frame) => frame,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        debug!(name = %name_clone, "All frame senders dropped");
                        break;
                    }
                };

                let mut guard = match provider.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => {
                        warn!(name = %name_clone, "Provider lock poisoned, recovering");
                        poisoned.into_inner()
                    }
                };
                guard.on_new_frame(frame);
                if after_frame(&mut *guard) == LoopAction::Stop {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }
            }

            info!(name = %name_clone, "Frame loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    ///
    /// A frame already being processed is allowed to complete.
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for frame loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Frame loop thread finished");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "FrameLoop dropped, stopping loop");
            self.stop();
        }
    }
}
