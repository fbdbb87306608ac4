// SPDX-License-Identifier: GPL-3.0-only

//! Scan-mode state

use super::feedback::Feedback;
use super::session::CameraSession;
use super::state::{FeedbackKind, Task};

pub struct ScanFlow {
    pub session: CameraSession,
    /// "Copied" flag for the scan result
    pub copied: Feedback,
    epoch: u64,
}

impl Default for ScanFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanFlow {
    pub fn new() -> Self {
        Self {
            session: CameraSession::new(),
            copied: Feedback::new(FeedbackKind::ResultCopied),
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the open-link action applies to the current result
    pub fn can_open_link(&self) -> bool {
        self.session.result().is_some_and(|r| r.is_link())
    }

    /// Clear the result and its feedback so another scan can start
    pub fn scan_another(&mut self) -> (bool, Task) {
        let cleared = self.session.reset_result();
        let task = if cleared {
            self.copied.cancel()
        } else {
            Task::none()
        };
        (cleared, task)
    }

    /// Stop the camera and drop all scan state
    pub fn discard(&mut self) -> Task {
        self.epoch += 1;
        Task::batch([self.session.discard(), self.copied.cancel()])
    }
}
