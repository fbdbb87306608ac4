// SPDX-License-Identifier: GPL-3.0-only

//! Effect executor
//!
//! Owns the [`AppModel`] and is the only place `update` is called from, so
//! the model sees one message at a time. Effects run on tokio (device and
//! clipboard work on the blocking pool) and report back over a channel as
//! [`Message`]s, which the frontend drains from its event loop.

use super::state::{AppModel, Effect, Message, StreamHandle, Task, TimerId};
use crate::backends::camera::{self, CameraDriver, DecodeCallback, DecodeEvent};
use crate::backends::clipboard::ClipboardBridge;
use crate::pipelines::export;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capabilities the effects are performed with
#[derive(Clone)]
pub struct Services {
    pub driver: Arc<dyn CameraDriver>,
    pub clipboard: Arc<dyn ClipboardBridge>,
}

pub struct Runtime {
    model: AppModel,
    services: Services,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    timers: HashMap<TimerId, JoinHandle<()>>,
}

impl Runtime {
    /// Must be called within a tokio runtime context
    pub fn new(model: AppModel, services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        info!(driver = services.driver.name(), "Runtime started");
        Self {
            model,
            services,
            tx,
            rx,
            timers: HashMap::new(),
        }
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    /// Handle for feeding messages from outside (input, signals)
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Apply one message and perform the effects it produces
    pub fn dispatch(&mut self, message: Message) {
        if let Message::FeedbackExpired(id) = &message {
            self.timers.remove(id);
        }
        let task = self.model.update(message);
        self.execute(task);
    }

    pub fn execute(&mut self, task: Task) {
        for effect in task.into_effects() {
            self.perform(effect);
        }
    }

    /// Wait for the next completion and apply it
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Apply every completion that is already queued; returns how many
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.dispatch(message);
            count += 1;
        }
        count
    }

    /// Process completions until `done` holds or `timeout` elapses
    pub async fn run_until(
        &mut self,
        done: impl Fn(&AppModel) -> bool,
        timeout: Duration,
    ) -> bool {
        let wait = async {
            while !done(&self.model) {
                if !self.next().await {
                    return false;
                }
            }
            true
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    /// Tear both flows down and wait for the camera to be released
    ///
    /// Returns whether teardown completed within `timeout`.
    pub async fn shutdown(&mut self, timeout: Duration) -> bool {
        self.dispatch(Message::Shutdown);
        let clean = self
            .run_until(|model| model.scan.session.is_idle(), timeout)
            .await;
        if clean {
            info!("Shutdown complete");
        } else {
            warn!(timeout_ms = timeout.as_millis() as u64, "Camera not released before shutdown timeout");
        }
        self.abort_timers();
        clean
    }

    fn abort_timers(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::AcquireCamera { id, request } => {
                debug!(session = %id, "Acquiring camera");
                let driver = Arc::clone(&self.services.driver);
                let tx = self.tx.clone();

                let events = self.tx.clone();
                let on_event: DecodeCallback = Arc::new(move |event: DecodeEvent| {
                    // Misses are per-frame noise, only outcomes reach the model
                    if event != DecodeEvent::NoSymbol {
                        let _ = events.send(Message::Decode { id, event });
                    }
                });

                tokio::task::spawn_blocking(move || {
                    let result =
                        camera::acquire(driver.as_ref(), &request, on_event).map(StreamHandle::new);
                    if let Err(Message::CameraAcquired {
                        result: Ok(stream), ..
                    }) = tx
                        .send(Message::CameraAcquired { id, result })
                        .map_err(|e| e.0)
                    {
                        // Nobody is listening anymore; do not leak the device
                        let _ = stream.into_inner().close();
                    }
                });
            }
            Effect::ReleaseCamera { id, stream } => {
                debug!(session = %id, device = %stream.device_path(), "Releasing camera");
                let tx = self.tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = stream.into_inner().close();
                    let _ = tx.send(Message::CameraReleased { id, result });
                });
            }
            Effect::Export {
                epoch,
                symbol,
                request,
            } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = export::export(symbol, request).await;
                    let _ = tx.send(Message::ExportFinished { epoch, result });
                });
            }
            Effect::Copy {
                origin,
                epoch,
                text,
            } => {
                let clipboard = Arc::clone(&self.services.clipboard);
                let tx = self.tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = clipboard.copy(&text);
                    let _ = tx.send(Message::CopyFinished {
                        origin,
                        epoch,
                        result,
                    });
                });
            }
            Effect::OpenUrl(url) => {
                let tx = self.tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = open::that_detached(url.as_str()).map_err(|e| e.to_string());
                    let _ = tx.send(Message::LinkOpened(result));
                });
            }
            Effect::ScheduleTimer { id, after } => {
                if let Some(previous) = self.timers.remove(&id) {
                    previous.abort();
                }
                let tx = self.tx.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Message::FeedbackExpired(id));
                });
                self.timers.insert(id, handle);
            }
            Effect::CancelTimer(id) => {
                if let Some(handle) = self.timers.remove(&id) {
                    debug!(?id, "Feedback timer cancelled");
                    handle.abort();
                }
            }
        }
    }

    /// Number of feedback timers still pending
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.abort_timers();
    }
}
