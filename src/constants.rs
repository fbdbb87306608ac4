// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Scanning constants
pub mod scan {
    use super::Duration;

    /// Target decode rate for camera frames
    pub const DEFAULT_FPS: u32 = 10;

    /// Side of the square recognition window, centred in the frame (pixels)
    pub const RECOGNITION_WINDOW: u32 = 250;

    /// Frames larger than this are downscaled before detection
    pub const MAX_PROCESS_DIMENSION: u32 = 640;

    /// Capture resolution requested from V4L2 devices
    pub const CAPTURE_WIDTH: u32 = 640;
    pub const CAPTURE_HEIGHT: u32 = 480;

    /// Number of mmap buffers for the V4L2 stream
    pub const CAPTURE_BUFFERS: u32 = 4;

    /// How long `open()` waits for the capture thread to report readiness
    pub const START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Symbol rendering constants (on-screen preview)
pub mod render {
    /// Preview side length in pixels
    pub const PREVIEW_SIZE: u32 = 200;

    /// Module colour, hsl(174 72% 50%)
    pub const FOREGROUND: &str = "#24dbc9";

    /// Quiet zone for printable renders, in modules
    pub const PRINTABLE_MARGIN: u32 = 4;
}

/// Export constants
pub mod export {
    /// Exported PNG side length in pixels
    pub const SIZE: u32 = 512;

    /// Opaque background painted under the symbol
    pub const BACKGROUND: &str = "#0f1419";

    /// Default file names
    pub const DEFAULT_FILENAME: &str = "qrcode.png";
    pub const DEFAULT_SVG_FILENAME: &str = "qrcode.svg";

    /// Largest raster surface the pipeline will allocate (per side)
    pub const MAX_SURFACE: u32 = 8192;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Display window of the "copied" / "downloaded" feedback flags
    pub const FEEDBACK_WINDOW: Duration = Duration::from_millis(2000);

    /// Upper bound on waiting for camera release during shutdown
    pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

    /// Input poll interval in terminal mode
    pub const TERMINAL_POLL: Duration = Duration::from_millis(16);

    /// Maximum number of notifications kept for display
    pub const NOTIFICATION_HISTORY: usize = 8;
}

/// User-visible messages
pub mod messages {
    pub const CAMERA_UNAVAILABLE: &str =
        "Failed to access camera. Please allow camera permissions.";
    pub const SCAN_SUCCESS: &str = "QR code scanned successfully!";
    pub const TEXT_COPIED: &str = "Text copied to clipboard";
    pub const RESULT_COPIED: &str = "Result copied to clipboard";
    pub const DOWNLOADED: &str = "QR code downloaded!";
    pub const INVALID_URL: &str = "Not a valid URL";
    pub const LINK_OPENED: &str = "Link opened in browser";
}

/// Application information utilities
pub mod app_info {
    /// Application identifier used for config and cache directories
    pub const APP_DIR: &str = "qr-studio";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
