// SPDX-License-Identifier: GPL-3.0-only

//! System clipboard access
//!
//! On X11 the process that wrote the clipboard has to keep serving it, so
//! the clipboard context lives on a dedicated thread for the life of the
//! bridge instead of being created per write.

use crate::errors::ClipboardError;
use copypasta::{ClipboardContext, ClipboardProvider};
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info, warn};

/// Text-to-clipboard capability
pub trait ClipboardBridge: Send + Sync {
    /// Place `text` on the clipboard, replacing its contents
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

struct CopyRequest {
    text: String,
    reply: mpsc::Sender<Result<(), ClipboardError>>,
}

/// The desktop clipboard
pub struct SystemClipboard {
    requests: Mutex<mpsc::Sender<CopyRequest>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<CopyRequest>();

        thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || serve(rx))
            .map_err(|e| warn!(error = %e, "Failed to spawn clipboard thread"))
            .ok();

        Self {
            requests: Mutex::new(tx),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardBridge for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let request = CopyRequest {
            text: text.to_string(),
            reply: reply_tx,
        };

        self.requests
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard thread poisoned".into()))?
            .send(request)
            .map_err(|_| ClipboardError::Unavailable("clipboard thread not running".into()))?;

        reply_rx
            .recv()
            .map_err(|_| ClipboardError::Unavailable("clipboard thread exited".into()))?
    }
}

/// Clipboard thread body; the context is created on first use and kept
fn serve(requests: mpsc::Receiver<CopyRequest>) {
    let mut ctx: Option<ClipboardContext> = None;

    for request in requests {
        if ctx.is_none() {
            match ClipboardContext::new() {
                Ok(c) => {
                    info!("Clipboard context created");
                    ctx = Some(c);
                }
                Err(e) => {
                    warn!(error = %e, "Clipboard unavailable");
                    let _ = request
                        .reply
                        .send(Err(ClipboardError::Unavailable(e.to_string())));
                    continue;
                }
            }
        }

        let result = match ctx.as_mut() {
            Some(c) => c.set_contents(request.text).map_err(|e| {
                warn!(error = %e, "Clipboard write failed");
                ClipboardError::Denied(e.to_string())
            }),
            None => Err(ClipboardError::Unavailable("no clipboard context".into())),
        };
        if result.is_ok() {
            debug!("Clipboard updated");
        }
        let _ = request.reply.send(result);
    }

    debug!("Clipboard thread exiting");
}
