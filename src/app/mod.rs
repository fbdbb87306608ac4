// SPDX-License-Identifier: GPL-3.0-only

//! Main application module for QR Studio
//!
//! This module contains the application state, message handling and the
//! business logic for generating and scanning QR codes. Rendering lives in
//! the frontends (`terminal`, the CLI commands); they only read the model
//! and send [`Message`]s.
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, Effect, Task)
//! - `mode`: Mode controller with deferred switching
//! - `generate`: Generate-mode state (payload, symbol, feedback)
//! - `scan`: Scan-mode state wrapping the camera session
//! - `session`: Camera session state machine
//! - `feedback`: Timed "copied"/"downloaded" flags
//! - `frame_processor`: Per-frame symbol detection
//! - `update`: Message handling
//! - `runtime`: Effect executor driving the model
//!
//! # Main Types
//!
//! - `AppModel`: Main application state
//! - `Message`: All possible user interactions and system events
//! - `Runtime`: Owns the model and performs its effects

mod feedback;
pub mod frame_processor;
mod generate;
mod handlers;
mod mode;
pub mod runtime;
mod scan;
pub mod session;
mod state;
mod update;

pub use feedback::Feedback;
pub use generate::GenerationFlow;
pub use mode::{ModeController, ModeSwitch};
pub use runtime::{Runtime, Services};
pub use scan::ScanFlow;
pub use session::{CameraSession, CameraSessionState};
pub use state::{
    AppModel, CopyOrigin, Effect, FeedbackKind, Message, Mode, Notification, NotificationLevel,
    SessionId, StreamHandle, Task, TimerId,
};

use crate::config::Config;
use crate::symbol::SymbolEncoder;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

impl AppModel {
    /// Build the model with injected capabilities, starting in Generate mode
    pub fn new(config: Config, encoder: Arc<dyn SymbolEncoder>) -> Self {
        let config = config.sanitized();
        info!(
            scan_fps = config.scan_fps,
            scan_window = config.scan_window,
            export_size = config.export_size,
            "Application model initialized"
        );

        Self {
            config,
            mode: ModeController::new(Mode::Generate),
            generate: GenerationFlow::new(encoder),
            scan: ScanFlow::new(),
            notifications: VecDeque::new(),
            shutting_down: false,
        }
    }

    pub fn current_mode(&self) -> Mode {
        self.mode.current()
    }
}
