// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Modules
//!
//! - [`camera`]: Camera drivers with device enumeration and frame decoding
//! - [`clipboard`]: System clipboard access

pub mod camera;
pub mod clipboard;
