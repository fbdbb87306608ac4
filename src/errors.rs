// SPDX-License-Identifier: MPL-2.0

//! Error types for the QR studio

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Symbol encoding errors
    Encode(EncodeError),
    /// Export pipeline errors
    Export(ExportError),
    /// Clipboard errors
    Clipboard(ClipboardError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Device could not be opened (permission denied, missing, busy)
    Unavailable(String),
    /// A session is already starting or streaming
    AlreadyActive,
    /// A scan result must be cleared before scanning again
    ResultPending,
    /// Decoder failed while streaming
    Fault(String),
}

/// Symbol encoder errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload exceeds the capacity of the largest symbol at this EC level
    DataTooLong,
    /// Any other encoder failure
    Failed(String),
}

/// Export pipeline errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Nothing to export (empty payload)
    NoSymbol,
    /// The symbol could not be serialized (empty or malformed module grid)
    InvalidSymbol(String),
    /// Drawing surface could not be created (zero or oversized target)
    SurfaceUnavailable { width: u32, height: u32 },
    /// Raster encoding failed
    EncodingFailed(String),
    /// Writing the output file failed
    SaveFailed(String),
}

/// Clipboard errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The clipboard refused the write
    Denied(String),
    /// No clipboard is reachable (headless session, missing display server)
    Unavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Encode(e) => write!(f, "Encoding error: {}", e),
            AppError::Export(e) => write!(f, "Export error: {}", e),
            AppError::Clipboard(e) => write!(f, "Clipboard error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::AlreadyActive => write!(f, "Camera session already active"),
            CameraError::ResultPending => write!(f, "Previous scan result not cleared"),
            CameraError::Fault(msg) => write!(f, "Decoder fault: {}", msg),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::DataTooLong => write!(f, "Text is too long for a QR code"),
            EncodeError::Failed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoSymbol => write!(f, "Nothing to export"),
            ExportError::InvalidSymbol(msg) => write!(f, "Invalid symbol: {}", msg),
            ExportError::SurfaceUnavailable { width, height } => {
                write!(f, "Drawing surface unavailable ({}x{})", width, height)
            }
            ExportError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            ExportError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Denied(msg) => write!(f, "Clipboard write denied: {}", msg),
            ClipboardError::Unavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for EncodeError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ClipboardError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        AppError::Encode(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<ClipboardError> for AppError {
    fn from(err: ClipboardError) -> Self {
        AppError::Clipboard(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        CameraError::Unavailable(err.to_string())
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::EncodingFailed(err.to_string())
    }
}
