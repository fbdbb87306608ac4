// SPDX-License-Identifier: GPL-3.0-only

//! Generate-mode state
//!
//! The payload is the only input; the rendered symbol is derived from it on
//! every change and never edited directly.

use super::feedback::Feedback;
use super::state::{FeedbackKind, Task};
use crate::errors::EncodeError;
use crate::symbol::{RenderParams, RenderedSymbol, SymbolEncoder};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct GenerationFlow {
    encoder: Arc<dyn SymbolEncoder>,
    params: RenderParams,
    payload: String,
    symbol: Option<RenderedSymbol>,
    encode_error: Option<EncodeError>,
    /// "Downloaded" flag
    pub download: Feedback,
    /// "Copied" flag
    pub copied: Feedback,
    /// Bumped on discard so in-flight completions can be recognised as stale
    epoch: u64,
}

impl GenerationFlow {
    pub fn new(encoder: Arc<dyn SymbolEncoder>) -> Self {
        Self::with_params(encoder, RenderParams::preview())
    }

    pub fn with_params(encoder: Arc<dyn SymbolEncoder>, params: RenderParams) -> Self {
        Self {
            encoder,
            params,
            payload: String::new(),
            symbol: None,
            encode_error: None,
            download: Feedback::new(FeedbackKind::Download),
            copied: Feedback::new(FeedbackKind::PayloadCopied),
            epoch: 0,
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn symbol(&self) -> Option<&RenderedSymbol> {
        self.symbol.as_ref()
    }

    /// Why the current payload has no symbol, if it is non-empty
    pub fn encode_error(&self) -> Option<&EncodeError> {
        self.encode_error.as_ref()
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Replace the payload and re-derive the symbol
    ///
    /// Any text is accepted. Text the encoder cannot fit leaves the payload
    /// set with no symbol and the encoder's error recorded.
    pub fn set_payload(&mut self, text: impl Into<String>) {
        self.payload = text.into();

        if self.payload.is_empty() {
            self.symbol = None;
            self.encode_error = None;
            return;
        }

        match self.encoder.encode(&self.payload, &self.params) {
            Ok(symbol) => {
                debug!(
                    chars = self.payload.chars().count(),
                    modules = symbol.grid().width(),
                    "Symbol updated"
                );
                self.symbol = Some(symbol);
                self.encode_error = None;
            }
            Err(e) => {
                warn!(error = %e, bytes = self.payload.len(), "Payload could not be encoded");
                self.symbol = None;
                self.encode_error = Some(e);
            }
        }
    }

    /// Drop all state and cancel pending feedback timers
    pub fn discard(&mut self) -> Task {
        self.payload.clear();
        self.symbol = None;
        self.encode_error = None;
        self.epoch += 1;
        Task::batch([self.download.cancel(), self.copied.cancel()])
    }
}
