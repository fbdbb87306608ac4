// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera drivers

//! Shared types for camera drivers

use std::sync::Arc;
use std::time::Instant;

/// Where a camera is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraLocation {
    Front,
    Back,
    External,
}

impl std::fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraLocation::Front => write!(f, "front"),
            CameraLocation::Back => write!(f, "back"),
            CameraLocation::External => write!(f, "external"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String, // Device node (/dev/videoN) or image file path
    pub location: CameraLocation,
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear-facing, pointed away from the user
    #[default]
    Environment,
    /// Front-facing, pointed at the user
    User,
}

impl FacingMode {
    /// Mount location that best satisfies this facing mode
    pub fn preferred_location(self) -> CameraLocation {
        match self {
            FacingMode::Environment => CameraLocation::Back,
            FacingMode::User => CameraLocation::Front,
        }
    }
}

/// Region of each frame submitted to the decoder, centred in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionWindow {
    pub width: u32,
    pub height: u32,
}

impl RecognitionWindow {
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Pixel rectangle `(x, y, width, height)` of this window inside a frame
    ///
    /// The window is clamped to the frame, so a window larger than the frame
    /// covers the whole frame.
    pub fn centered_in(&self, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let width = self.width.min(frame_width);
        let height = self.height.min(frame_height);
        (
            (frame_width - width) / 2,
            (frame_height - height) / 2,
            width,
            height,
        )
    }
}

/// Parameters of a camera acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub facing: FacingMode,
    /// Target decode rate; frames beyond it are dropped
    pub fps: u32,
    /// `None` decodes the whole frame
    pub window: Option<RecognitionWindow>,
    /// Explicit device, bypassing the facing-mode preference
    pub device_path: Option<String>,
}

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luminance only
    Gray8,
    /// 8-bit RGBA
    RGBA,
    /// Packed 4:2:2, Y0 U Y1 V
    YUYV,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::RGBA => 4,
            PixelFormat::YUYV => 2,
        }
    }
}

/// A single captured frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Tightly packed copy of the luminance plane inside `(x, y, w, h)`
    ///
    /// Returns `None` if the rectangle or the buffer is out of range.
    pub fn luma_region(&self, x: u32, y: u32, w: u32, h: u32) -> Option<Vec<u8>> {
        if w == 0 || h == 0 || x + w > self.width || y + h > self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel() as usize;
        let stride = self.stride as usize;
        let last_row_end = (y + h - 1) as usize * stride + (x + w) as usize * bpp;
        if last_row_end > self.data.len() {
            return None;
        }

        let mut out = Vec::with_capacity((w * h) as usize);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * bpp;
            let line = &self.data[start..start + w as usize * bpp];
            match self.format {
                PixelFormat::Gray8 => out.extend_from_slice(line),
                // Luma sits at every even byte
                PixelFormat::YUYV => out.extend(line.iter().step_by(2)),
                PixelFormat::RGBA => out.extend(line.chunks_exact(4).map(|px| {
                    ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8
                })),
            }
        }
        Some(out)
    }

    /// Luminance of the whole frame
    pub fn luma(&self) -> Option<Vec<u8>> {
        self.luma_region(0, 0, self.width, self.height)
    }
}

/// Per-frame outcome reported by a running stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A symbol was found; carries the decoded text
    Decoded(String),
    /// The frame held no readable symbol
    NoSymbol,
    /// Capture or decoder failure; the stream is unusable
    Fault(String),
}

/// Sink for decode events, called from the capture thread
pub type DecodeCallback = Arc<dyn Fn(DecodeEvent) + Send + Sync>;

/// Result type for driver operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for driver operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Access to the device was refused
    PermissionDenied(String),
    /// No device matches the request
    DeviceNotFound(String),
    /// The device is held by another process
    Busy(String),
    /// Failed to start streaming
    InitializationFailed(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Busy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            std::io::ErrorKind::ResourceBusy => BackendError::Busy(err.to_string()),
            _ => BackendError::IoError(err.to_string()),
        }
    }
}
