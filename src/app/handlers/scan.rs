// SPDX-License-Identifier: GPL-3.0-only

//! Scan handlers
//!
//! Feeds camera session transitions from user actions and from the
//! acquisition, release and decode completions, and handles the actions
//! offered on a scan result.

use crate::app::session::CameraSessionState;
use crate::app::state::{
    AppModel, CopyOrigin, Effect, Mode, NotificationLevel, SessionId, StreamHandle, Task,
};
use crate::backends::camera::{BackendError, DecodeEvent};
use crate::constants::messages;
use crate::errors::CameraError;
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_start_scan(&mut self) -> Task {
        if self.shutting_down {
            return Task::none();
        }
        if self.mode.current() != Mode::Scan || self.mode.pending().is_some() {
            debug!("Ignoring scan start outside Scan mode");
            return Task::none();
        }

        match self.scan.session.start(self.config.scan_request()) {
            Ok(task) => task,
            Err(CameraError::AlreadyActive) => {
                debug!("Scan already running");
                Task::none()
            }
            Err(e) => {
                self.notify(NotificationLevel::Info, e.to_string());
                Task::none()
            }
        }
    }

    pub(crate) fn handle_stop_scan(&mut self) -> Task {
        let task = self.scan.session.stop();
        self.settle_mode();
        task
    }

    pub(crate) fn handle_camera_acquired(
        &mut self,
        id: SessionId,
        result: Result<StreamHandle, BackendError>,
    ) -> Task {
        let before = self.scan.session.state();
        let task = self.scan.session.acquired(id, result);

        if before == CameraSessionState::Starting
            && self.scan.session.state() == CameraSessionState::Error
        {
            if let Some(reason) = self.scan.session.error_message() {
                warn!(session = %id, %reason, "Camera unavailable");
            }
            self.notify(NotificationLevel::Error, messages::CAMERA_UNAVAILABLE);
        }

        self.settle_mode();
        task
    }

    pub(crate) fn handle_camera_released(
        &mut self,
        id: SessionId,
        result: Result<(), BackendError>,
    ) -> Task {
        let task = self.scan.session.released(id, result);
        self.settle_mode();
        task
    }

    pub(crate) fn handle_decode(&mut self, id: SessionId, event: DecodeEvent) -> Task {
        let before = self.scan.session.state();
        let had_result = self.scan.session.result().is_some();
        let task = self.scan.session.decode(id, event);

        if !had_result && self.scan.session.result().is_some() {
            self.notify(NotificationLevel::Success, messages::SCAN_SUCCESS);
        } else if before == CameraSessionState::Active
            && self.scan.session.state() == CameraSessionState::Error
        {
            let reason = self.scan.session.error_message().unwrap_or_default();
            let message = CameraError::Fault(reason.to_string()).to_string();
            self.notify(NotificationLevel::Error, message);
        }

        self.settle_mode();
        task
    }

    pub(crate) fn handle_copy_result(&mut self) -> Task {
        if self.shutting_down {
            return Task::none();
        }
        let Some(result) = self.scan.session.result() else {
            debug!("No scan result to copy");
            return Task::none();
        };

        Task::effect(Effect::Copy {
            origin: CopyOrigin::ScanResult,
            epoch: self.scan.epoch(),
            text: result.text.clone(),
        })
    }

    pub(crate) fn handle_open_link(&mut self) -> Task {
        let Some(result) = self.scan.session.result() else {
            return Task::none();
        };

        match result.link.clone() {
            Some(url) => {
                info!(url = %url, "Opening scanned link");
                Task::effect(Effect::OpenUrl(url))
            }
            None => {
                self.notify(NotificationLevel::Error, messages::INVALID_URL);
                Task::none()
            }
        }
    }

    pub(crate) fn handle_link_opened(&mut self, result: Result<(), String>) -> Task {
        match result {
            Ok(()) => self.notify(NotificationLevel::Info, messages::LINK_OPENED),
            Err(e) => self.notify(NotificationLevel::Error, format!("Failed to open link: {}", e)),
        }
        Task::none()
    }

    pub(crate) fn handle_scan_another(&mut self) -> Task {
        let (cleared, task) = self.scan.scan_another();
        if cleared {
            info!("Scan result cleared");
        }
        task
    }
}
