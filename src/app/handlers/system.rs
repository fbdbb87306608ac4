// SPDX-License-Identifier: GPL-3.0-only

//! System handlers
//!
//! Handles clipboard completions, feedback timers and shutdown.

use crate::app::state::{AppModel, CopyOrigin, FeedbackKind, NotificationLevel, Task, TimerId};
use crate::constants::messages;
use crate::errors::ClipboardError;
use tracing::{debug, info};

impl AppModel {
    pub(crate) fn handle_copy_finished(
        &mut self,
        origin: CopyOrigin,
        epoch: u64,
        result: Result<(), ClipboardError>,
    ) -> Task {
        let current = match origin {
            CopyOrigin::Payload => self.generate.epoch(),
            CopyOrigin::ScanResult => self.scan.epoch(),
        };
        if epoch != current {
            debug!(?origin, epoch, "Ignoring copy completion for discarded flow");
            return Task::none();
        }

        match result {
            Ok(()) => {
                let window = self.config.feedback_window();
                match origin {
                    CopyOrigin::Payload => {
                        self.notify(NotificationLevel::Success, messages::TEXT_COPIED);
                        self.generate.copied.trigger(window)
                    }
                    CopyOrigin::ScanResult => {
                        self.notify(NotificationLevel::Success, messages::RESULT_COPIED);
                        self.scan.copied.trigger(window)
                    }
                }
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, e.to_string());
                Task::none()
            }
        }
    }

    pub(crate) fn handle_feedback_expired(&mut self, id: TimerId) -> Task {
        let cleared = match id.kind {
            FeedbackKind::Download => self.generate.download.expire(id),
            FeedbackKind::PayloadCopied => self.generate.copied.expire(id),
            FeedbackKind::ResultCopied => self.scan.copied.expire(id),
        };
        if !cleared {
            debug!(?id, "Stale feedback timer");
        }
        Task::none()
    }

    pub(crate) fn handle_shutdown(&mut self) -> Task {
        if self.shutting_down {
            return Task::none();
        }
        info!("Shutting down");
        self.shutting_down = true;
        Task::batch([self.scan.discard(), self.generate.discard()])
    }
}
