// SPDX-License-Identifier: GPL-3.0-only

//! Generate handlers
//!
//! Handles payload edits, PNG/SVG export and copying the payload.

use crate::app::state::{AppModel, CopyOrigin, Effect, Mode, NotificationLevel, Task};
use crate::constants::{export, messages};
use crate::errors::ExportError;
use crate::pipelines::export::{ExportFormat, ExportRequest, unique_path};
use crate::symbol::{Color, RenderParams};
use std::path::PathBuf;
use tracing::{debug, info};

impl AppModel {
    pub(crate) fn handle_payload_changed(&mut self, text: String) -> Task {
        if self.mode.current() != Mode::Generate {
            debug!("Ignoring payload change outside Generate mode");
            return Task::none();
        }

        let had_error = self.generate.encode_error().is_some();
        self.generate.set_payload(text);
        if !had_error && let Some(e) = self.generate.encode_error() {
            let message = e.to_string();
            self.notify(NotificationLevel::Error, message);
        }
        Task::none()
    }

    pub(crate) fn handle_export_image(&mut self) -> Task {
        self.start_export(ExportFormat::Png)
    }

    pub(crate) fn handle_export_vector(&mut self) -> Task {
        self.start_export(ExportFormat::Svg)
    }

    fn start_export(&mut self, format: ExportFormat) -> Task {
        if self.shutting_down || self.mode.current() != Mode::Generate {
            return Task::none();
        }

        let Some(symbol) = self.generate.symbol() else {
            self.notify(NotificationLevel::Error, ExportError::NoSymbol.to_string());
            return Task::none();
        };

        let filename = match format {
            ExportFormat::Png => export::DEFAULT_FILENAME,
            ExportFormat::Svg => export::DEFAULT_SVG_FILENAME,
        };
        let request = ExportRequest {
            format,
            size: self.config.export_size,
            background: Color::from_hex(export::BACKGROUND).unwrap_or(Color::BLACK),
            path: unique_path(&self.config.export_dir(), filename),
        };
        let symbol = symbol.with_params(RenderParams {
            size: request.size,
            ..*symbol.params()
        });

        info!(path = %request.path.display(), format = ?format, "Export requested");
        Task::effect(Effect::Export {
            epoch: self.generate.epoch(),
            symbol,
            request,
        })
    }

    pub(crate) fn handle_export_finished(
        &mut self,
        epoch: u64,
        result: Result<PathBuf, ExportError>,
    ) -> Task {
        if epoch != self.generate.epoch() {
            debug!(epoch, "Ignoring export completion for discarded payload");
            return Task::none();
        }

        match result {
            Ok(path) => {
                info!(path = %path.display(), "QR code exported");
                self.notify(NotificationLevel::Success, messages::DOWNLOADED);
                self.generate.download.trigger(self.config.feedback_window())
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Export failed: {}", e));
                Task::none()
            }
        }
    }

    pub(crate) fn handle_copy_payload(&mut self) -> Task {
        if self.shutting_down || self.mode.current() != Mode::Generate {
            return Task::none();
        }
        if self.generate.payload().is_empty() {
            debug!("Nothing to copy");
            return Task::none();
        }

        Task::effect(Effect::Copy {
            origin: CopyOrigin::Payload,
            epoch: self.generate.epoch(),
            text: self.generate.payload().to_string(),
        })
    }
}
