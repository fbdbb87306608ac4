// SPDX-License-Identifier: GPL-3.0-only

//! Transient feedback flags ("copied", "downloaded")
//!
//! A flag is raised together with a timer. Every raise or cancel bumps the
//! generation, so an expiry from an older timer can never clear a newer
//! raise, and nothing fires into a flow that has been torn down.

use super::state::{Effect, FeedbackKind, Task, TimerId};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Feedback {
    kind: FeedbackKind,
    active: bool,
    generation: u64,
}

impl Feedback {
    pub fn new(kind: FeedbackKind) -> Self {
        Self {
            kind,
            active: false,
            generation: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn timer_id(&self) -> TimerId {
        TimerId {
            kind: self.kind,
            generation: self.generation,
        }
    }

    /// Raise the flag for `window`, restarting the window if already raised
    pub fn trigger(&mut self, window: Duration) -> Task {
        let cancel = self.cancel();
        self.active = true;
        cancel.chain(Task::effect(Effect::ScheduleTimer {
            id: self.timer_id(),
            after: window,
        }))
    }

    /// Timer fired; returns whether the flag was cleared
    pub fn expire(&mut self, id: TimerId) -> bool {
        if self.active && id == self.timer_id() {
            self.active = false;
            true
        } else {
            false
        }
    }

    /// Drop the flag and its pending timer
    pub fn cancel(&mut self) -> Task {
        let task = if self.active {
            Task::effect(Effect::CancelTimer(self.timer_id()))
        } else {
            Task::none()
        };
        self.active = false;
        self.generation += 1;
        task
    }
}
