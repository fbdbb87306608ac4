// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! This module handles all application messages by routing them to focused handler methods.
//! The main `update()` function acts as a dispatcher, while specific handlers are implemented
//! in the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::mode`: Mode selection and deferred switches
//! - `handlers::generate`: Payload edits, export, payload copy
//! - `handlers::scan`: Camera session lifecycle, result actions
//! - `handlers::system`: Clipboard completions, feedback timers, shutdown

use crate::app::state::{AppModel, Message, Task};
use tracing::debug;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    ///
    /// Never blocks: anything that touches a device, the clipboard or the
    /// filesystem is returned as an effect in the [`Task`].
    pub fn update(&mut self, message: Message) -> Task {
        debug!(?message, "Update");

        match message {
            // ===== Mode =====
            Message::SelectMode(mode) => self.handle_select_mode(mode),

            // ===== Generate =====
            Message::PayloadChanged(text) => self.handle_payload_changed(text),
            Message::ExportImage => self.handle_export_image(),
            Message::ExportVector => self.handle_export_vector(),
            Message::ExportFinished { epoch, result } => self.handle_export_finished(epoch, result),
            Message::CopyPayload => self.handle_copy_payload(),

            // ===== Scan =====
            Message::StartScan => self.handle_start_scan(),
            Message::StopScan => self.handle_stop_scan(),
            Message::CameraAcquired { id, result } => self.handle_camera_acquired(id, result),
            Message::CameraReleased { id, result } => self.handle_camera_released(id, result),
            Message::Decode { id, event } => self.handle_decode(id, event),
            Message::CopyResult => self.handle_copy_result(),
            Message::OpenLink => self.handle_open_link(),
            Message::LinkOpened(result) => self.handle_link_opened(result),
            Message::ScanAnother => self.handle_scan_another(),

            // ===== Shared =====
            Message::CopyFinished {
                origin,
                epoch,
                result,
            } => self.handle_copy_finished(origin, epoch, result),
            Message::FeedbackExpired(id) => self.handle_feedback_expired(id),
            Message::Shutdown => self.handle_shutdown(),
        }
    }
}
