// SPDX-License-Identifier: MPL-2.0

//! QR Studio - Generate QR codes from text and scan them with a camera
//!
//! This library provides the core functionality of the QR Studio application:
//! symbol generation and export, camera scanning, and the state machines that
//! tie them together.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Application state, message handling and the effect runtime
//! - [`backends`]: Camera driver and clipboard abstractions
//! - [`symbol`]: Symbol encoding and vector rendering
//! - [`pipelines`]: Export pipeline (rasterization, file output)
//! - [`config`]: User configuration handling
//! - [`storage`]: Export and log file locations, atomic writes
//! - [`terminal`]: Interactive terminal frontend
//!
//! # Example
//!
//! ```ignore
//! // Usually run via the binary:
//! // qr-studio            (terminal UI)
//! // qr-studio scan --copy
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod symbol;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{QrDetection, ScanResult};
pub use app::{AppModel, Message, Mode};
pub use config::Config;
