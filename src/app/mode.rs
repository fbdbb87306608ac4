// SPDX-License-Identifier: GPL-3.0-only

//! Mode controller
//!
//! Leaving Scan only completes once the camera session has settled, so the
//! controller tracks a pending target next to the current mode.

use super::state::Mode;
use tracing::debug;

/// Outcome of a mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    /// Already current (any pending switch was abandoned)
    Unchanged,
    /// Switched synchronously
    Immediate,
    /// Waiting for teardown of the current flow
    Deferred,
}

#[derive(Debug, Default)]
pub struct ModeController {
    current: Mode,
    pending: Option<Mode>,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            current: initial,
            pending: None,
        }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    pub fn pending(&self) -> Option<Mode> {
        self.pending
    }

    /// Select `next`; `teardown_pending` says whether the current flow still
    /// holds resources that must be released first
    pub fn select(&mut self, next: Mode, teardown_pending: bool) -> ModeSwitch {
        if next == self.current {
            if let Some(abandoned) = self.pending.take() {
                debug!(mode = %next, abandoned = %abandoned, "Pending mode switch abandoned");
            }
            return ModeSwitch::Unchanged;
        }

        if teardown_pending {
            debug!(from = %self.current, to = %next, "Mode switch waits for teardown");
            self.pending = Some(next);
            ModeSwitch::Deferred
        } else {
            debug!(from = %self.current, to = %next, "Mode switched");
            self.current = next;
            self.pending = None;
            ModeSwitch::Immediate
        }
    }

    /// Teardown finished; completes a pending switch
    pub fn teardown_complete(&mut self) -> Option<Mode> {
        let next = self.pending.take()?;
        debug!(from = %self.current, to = %next, "Deferred mode switch completed");
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_switch() {
        let mut modes = ModeController::default();
        assert_eq!(modes.current(), Mode::Generate);
        assert_eq!(modes.select(Mode::Scan, false), ModeSwitch::Immediate);
        assert_eq!(modes.current(), Mode::Scan);
        assert_eq!(modes.select(Mode::Scan, false), ModeSwitch::Unchanged);
    }

    #[test]
    fn test_deferred_switch() {
        let mut modes = ModeController::new(Mode::Scan);
        assert_eq!(modes.select(Mode::Generate, true), ModeSwitch::Deferred);
        assert_eq!(modes.current(), Mode::Scan);
        assert_eq!(modes.pending(), Some(Mode::Generate));

        assert_eq!(modes.teardown_complete(), Some(Mode::Generate));
        assert_eq!(modes.current(), Mode::Generate);
        assert_eq!(modes.teardown_complete(), None);
    }

    #[test]
    fn test_reselect_abandons_pending() {
        let mut modes = ModeController::new(Mode::Scan);
        let _ = modes.select(Mode::Generate, true);
        assert_eq!(modes.select(Mode::Scan, true), ModeSwitch::Unchanged);
        assert_eq!(modes.pending(), None);
        assert_eq!(modes.teardown_complete(), None);
    }
}
