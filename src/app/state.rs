// SPDX-License-Identifier: GPL-3.0-only

//! Application state types

use super::generate::GenerationFlow;
use super::mode::ModeController;
use super::scan::ScanFlow;
use crate::backends::camera::{BackendError, CameraStream, DecodeEvent, ScanRequest};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::{ClipboardError, ExportError};
use crate::pipelines::export::ExportRequest;
use crate::symbol::RenderedSymbol;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// Top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Text in, symbol out
    #[default]
    Generate,
    /// Camera in, text out
    Scan,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Generate => write!(f, "Generate"),
            Mode::Scan => write!(f, "Scan"),
        }
    }
}

/// Identifies one camera acquisition
///
/// Completions carrying an id other than the session's current one are
/// stale and never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.simple().to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Which transient flag a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    /// "Downloaded" after an export
    Download,
    /// "Copied" for the generator payload
    PayloadCopied,
    /// "Copied" for the scan result
    ResultCopied,
}

/// Identifies one scheduled feedback timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub kind: FeedbackKind,
    pub generation: u64,
}

/// Which flow asked for a clipboard write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOrigin {
    Payload,
    ScanResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// User-visible message (toast)
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Open camera stream travelling between the executor and the session
pub struct StreamHandle(Box<dyn CameraStream>);

impl StreamHandle {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self(stream)
    }

    pub fn into_inner(self) -> Box<dyn CameraStream> {
        self.0
    }

    pub fn device_path(&self) -> &str {
        &self.0.device().path
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StreamHandle")
            .field(&self.0.device().path)
            .finish()
    }
}

/// Messages for the application
#[derive(Debug)]
pub enum Message {
    // ===== Mode =====
    /// Switch between Generate and Scan
    SelectMode(Mode),

    // ===== Generate =====
    /// Generator text changed
    PayloadChanged(String),
    /// Export the current symbol as PNG
    ExportImage,
    /// Export the current symbol as SVG
    ExportVector,
    /// Export finished (epoch of the flow that requested it)
    ExportFinished {
        epoch: u64,
        result: Result<PathBuf, ExportError>,
    },
    /// Copy the generator text
    CopyPayload,

    // ===== Scan =====
    /// Start the camera
    StartScan,
    /// Stop the camera
    StopScan,
    /// Device acquisition resolved
    CameraAcquired {
        id: SessionId,
        result: Result<StreamHandle, BackendError>,
    },
    /// Device release resolved
    CameraReleased {
        id: SessionId,
        result: Result<(), BackendError>,
    },
    /// Decoder reported on a frame
    Decode { id: SessionId, event: DecodeEvent },
    /// Copy the scan result
    CopyResult,
    /// Open the scan result in the browser
    OpenLink,
    /// Browser launch resolved
    LinkOpened(Result<(), String>),
    /// Clear the result so a new scan can start
    ScanAnother,

    // ===== Shared =====
    /// Clipboard write resolved
    CopyFinished {
        origin: CopyOrigin,
        epoch: u64,
        result: Result<(), ClipboardError>,
    },
    /// A feedback display window elapsed
    FeedbackExpired(TimerId),
    /// Tear everything down before exit
    Shutdown,
}

/// Side effect requested by the model, performed by the runtime
#[derive(Debug)]
pub enum Effect {
    AcquireCamera {
        id: SessionId,
        request: ScanRequest,
    },
    ReleaseCamera {
        id: SessionId,
        stream: StreamHandle,
    },
    Export {
        epoch: u64,
        symbol: RenderedSymbol,
        request: ExportRequest,
    },
    Copy {
        origin: CopyOrigin,
        epoch: u64,
        text: String,
    },
    OpenUrl(url::Url),
    ScheduleTimer {
        id: TimerId,
        after: Duration,
    },
    CancelTimer(TimerId),
}

/// Effects produced by one update
#[derive(Debug, Default)]
#[must_use]
pub struct Task {
    effects: Vec<Effect>,
}

impl Task {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
        }
    }

    pub fn batch(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            effects: tasks.into_iter().flat_map(|t| t.effects).collect(),
        }
    }

    pub fn chain(mut self, other: Task) -> Self {
        self.effects.extend(other.effects);
        self
    }

    pub fn is_none(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

/// The application model stores app-specific state and drives its logic.
pub struct AppModel {
    /// Configuration loaded at startup
    pub config: Config,
    /// Which flow is current
    pub mode: ModeController,
    /// Generate-mode state
    pub generate: GenerationFlow,
    /// Scan-mode state
    pub scan: ScanFlow,
    /// Most recent notifications, oldest first
    pub notifications: VecDeque<Notification>,
    /// Set once shutdown has begun; no new work is accepted
    pub shutting_down: bool,
}

impl AppModel {
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NotificationLevel::Error => error!(%message, "Notification"),
            _ => info!(%message, "Notification"),
        }
        if self.notifications.len() >= timing::NOTIFICATION_HISTORY {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            level,
            message,
            at: Local::now(),
        });
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }
}
