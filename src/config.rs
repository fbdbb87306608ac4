// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/qr-studio/config.json`. A missing or
//! unreadable file is never fatal; defaults are used instead.

use crate::backends::camera::{FacingMode, RecognitionWindow, ScanRequest};
use crate::constants::{app_info, export, scan, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera device to use instead of the facing-mode preference (e.g. /dev/video2)
    pub camera_path: Option<String>,
    /// Target decode rate while scanning
    pub scan_fps: u32,
    /// Recognition window side in pixels (0 = whole frame)
    pub scan_window: u32,
    /// Side length of exported PNGs
    pub export_size: u32,
    /// Directory exports are written to (defaults to the download directory)
    pub export_dir: Option<PathBuf>,
    /// How long "copied"/"downloaded" feedback stays visible
    pub feedback_window_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_path: None,
            scan_fps: scan::DEFAULT_FPS,
            scan_window: scan::RECOGNITION_WINDOW,
            export_size: export::SIZE,
            export_dir: None,
            feedback_window_ms: timing::FEEDBACK_WINDOW.as_millis() as u64,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR).join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&contents) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Write this configuration as pretty JSON
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp values that would make the app unusable
    pub fn sanitized(mut self) -> Self {
        if self.scan_fps == 0 {
            warn!("scan_fps must be positive, using default");
            self.scan_fps = scan::DEFAULT_FPS;
        }
        if self.export_size == 0 || self.export_size > export::MAX_SURFACE {
            warn!(size = self.export_size, "export_size out of range, using default");
            self.export_size = export::SIZE;
        }
        self
    }

    /// Camera request derived from the scan settings
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            facing: FacingMode::Environment,
            fps: self.scan_fps,
            window: (self.scan_window > 0).then(|| RecognitionWindow::square(self.scan_window)),
            device_path: self.camera_path.clone(),
        }
    }

    pub fn feedback_window(&self) -> Duration {
        Duration::from_millis(self.feedback_window_ms)
    }

    /// Directory exports go to
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(crate::storage::default_export_dir)
    }
}
