// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for capture loops
//!
//! Every camera driver runs its capture-and-decode loop on a dedicated
//! thread. The controller owns that thread, reports whether its resources
//! came up, and guarantees the thread has exited once `stop()` returns.

use super::types::{BackendError, BackendResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = CaptureLoopController::start_with_init(
///     "v4l2-scan",
///     Duration::from_secs(5),
///     || open_device(),
///     move |device| match device.next_frame() {
///         Ok(frame) => {
///             decode(frame);
///             LoopAction::Continue
///         }
///         Err(_) => LoopAction::Stop,
///     },
/// )?;
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Start a capture loop whose resources are created on the loop thread
    ///
    /// Blocks until `init_fn` has finished on the new thread. If it fails,
    /// or does not finish within `timeout`, the error is returned and no
    /// loop iteration ever runs. Device handles that are not `Send` can be
    /// created here since they never leave the thread.
    pub fn start_with_init<S, I, F>(
        name: &str,
        timeout: Duration,
        init_fn: I,
        mut loop_fn: F,
    ) -> BackendResult<Self>
    where
        S: 'static,
        I: FnOnce() -> BackendResult<S> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<BackendResult<()>>(1);

        info!(name = %name, "Starting capture loop with initialization");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Capture loop thread started, initializing...");

            let mut state = match init_fn() {
                Ok(s) => {
                    debug!(name = %name_clone, "Initialization successful");
                    let _ = ready_tx.send(Ok(()));
                    s
                }
                Err(e) => {
                    warn!(name = %name_clone, error = %e, "Initialization failed");
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            run_loop(&name_clone, &stop_signal_clone, || loop_fn(&mut state));
            info!(name = %name_clone, "Capture loop thread exiting");
        });

        let mut controller = Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        };

        match ready_rx.recv_timeout(timeout) {
            Ok(Ok(())) => Ok(controller),
            Ok(Err(e)) => {
                controller.join();
                Err(e)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(name = %name, ?timeout, "Initialization timed out");
                controller.detach();
                Err(BackendError::InitializationFailed(format!(
                    "device did not start within {:?}",
                    timeout
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                controller.join();
                Err(BackendError::InitializationFailed(
                    "capture thread exited during initialization".into(),
                ))
            }
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
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    ///
    /// Useful if the loop stops itself via `LoopAction::Stop`.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }

    /// Signal stop and let the thread finish on its own
    ///
    /// Used when the thread is stuck in a blocking call that cannot be
    /// interrupted; it exits at its next stop check.
    fn detach(&mut self) {
        self.request_stop();
        if self.thread_handle.take().is_some() {
            debug!(name = %self.name, "Detached capture loop thread");
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

fn run_loop(name: &str, stop_signal: &AtomicBool, mut step: impl FnMut() -> LoopAction) {
    loop {
        // Check stop signal first
        if stop_signal.load(Ordering::SeqCst) {
            debug!(name = %name, "Stop signal received");
            break;
        }

        match step() {
            LoopAction::Continue => {}
            LoopAction::Stop => {
                debug!(name = %name, "Loop requested stop");
                break;
            }
        }
    }
}

/// Caps how often frames are handed to the decoder
#[derive(Debug)]
pub struct FrameThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameThrottle {
    /// Throttle to `fps` frames per second (at least one)
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a frame arriving now should be decoded
    ///
    /// Used by drivers that receive frames at the device rate and drop
    /// the excess.
    pub fn admit(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Sleep until the next frame is due, waking early on `stop`
    ///
    /// Used by drivers that produce frames on demand.
    pub fn wait(&mut self, stop: &AtomicBool) {
        if let Some(last) = self.last {
            let due = last + self.interval;
            // Short slices keep stop latency low
            while !stop.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now >= due {
                    break;
                }
                thread::sleep((due - now).min(Duration::from_millis(20)));
            }
        }
        self.last = Some(Instant::now());
    }
}
