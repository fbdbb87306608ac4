// SPDX-License-Identifier: GPL-3.0-only

//! Mode handlers
//!
//! Leaving a mode discards that mode's state. Leaving Scan additionally
//! waits for the camera to be released before the new mode becomes current.

use crate::app::mode::ModeSwitch;
use crate::app::state::{AppModel, Mode, Task};
use tracing::info;

impl AppModel {
    pub(crate) fn handle_select_mode(&mut self, next: Mode) -> Task {
        if self.shutting_down {
            return Task::none();
        }

        let current = self.mode.current();
        if next == current {
            let _ = self.mode.select(next, false);
            return Task::none();
        }

        let teardown = match current {
            Mode::Scan => self.scan.discard(),
            Mode::Generate => self.generate.discard(),
        };
        let pending = current == Mode::Scan && !self.scan.session.is_idle();

        match self.mode.select(next, pending) {
            ModeSwitch::Immediate => info!(mode = %next, "Mode selected"),
            ModeSwitch::Deferred => info!(mode = %next, "Mode selected, releasing camera first"),
            ModeSwitch::Unchanged => {}
        }
        teardown
    }

    /// Complete a deferred switch once the session has settled
    pub(crate) fn settle_mode(&mut self) {
        if self.mode.pending().is_some()
            && self.scan.session.is_idle()
            && let Some(mode) = self.mode.teardown_complete()
        {
            info!(mode = %mode, "Camera released, mode switch complete");
        }
    }
}
