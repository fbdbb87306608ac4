// SPDX-License-Identifier: MPL-2.0
// Camera drivers with trait-based abstraction

//! Camera driver abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   Camera Session    │  ← Lifecycle state machine (app layer)
//! └──────────┬──────────┘
//!            │ acquire / close
//!            ▼
//! ┌─────────────────────┐
//! │  CameraDriver Trait │  ← Enumeration, stream creation
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//!  ┌──────┐   ┌──────────┐
//!  │ V4L2 │   │Image file│
//!  └──────┘   └──────────┘
//! ```
//!
//! A stream decodes on its own capture thread and reports every frame's
//! outcome through a [`DecodeCallback`] until it is closed.

pub mod file_source;
pub mod frame_loop;
pub mod types;
pub mod v4l2;

pub use file_source::ImageFileDriver;
pub use types::*;
pub use v4l2::V4l2Driver;

use tracing::{debug, info};

/// Camera driver trait
///
/// `open` blocks until the device is streaming or has failed; callers run
/// it off the UI thread.
pub trait CameraDriver: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open `device` and start decoding frames
    ///
    /// # Returns
    /// * `Ok(stream)` - Streaming; `on_event` is called for every decoded frame
    /// * `Err(BackendError::PermissionDenied)` - Access refused
    /// * `Err(BackendError)` - Device missing, busy or not streamable
    fn open(
        &self,
        device: &CameraDevice,
        request: &ScanRequest,
        on_event: DecodeCallback,
    ) -> BackendResult<Box<dyn CameraStream>>;
}

/// An open, streaming camera
pub trait CameraStream: Send {
    fn device(&self) -> &CameraDevice;

    /// False once the capture thread has exited (fault or close)
    fn is_running(&self) -> bool;

    /// Stop streaming and release the device
    ///
    /// Returns once the capture thread has exited; no callback runs after.
    fn close(self: Box<Self>) -> BackendResult<()>;
}

/// Pick the device that best matches `request`
///
/// An explicit device path wins. Otherwise the facing mode's preferred
/// location is tried, then external cameras, then anything.
pub fn select_device(devices: &[CameraDevice], request: &ScanRequest) -> Option<CameraDevice> {
    if let Some(path) = &request.device_path {
        return devices.iter().find(|d| &d.path == path).cloned();
    }

    let preferred = request.facing.preferred_location();
    devices
        .iter()
        .find(|d| d.location == preferred)
        .or_else(|| devices.iter().find(|d| d.location == CameraLocation::External))
        .or_else(|| devices.first())
        .cloned()
}

/// Enumerate, select and open a camera for `request`
pub fn acquire(
    driver: &dyn CameraDriver,
    request: &ScanRequest,
    on_event: DecodeCallback,
) -> BackendResult<Box<dyn CameraStream>> {
    let devices = driver.enumerate_cameras();
    debug!(driver = driver.name(), count = devices.len(), "Enumerated cameras");

    let device = select_device(&devices, request).ok_or_else(|| {
        BackendError::DeviceNotFound(match &request.device_path {
            Some(path) => format!("no camera at {}", path),
            None => format!("no camera available via {}", driver.name()),
        })
    })?;

    info!(
        device = %device.name,
        path = %device.path,
        location = %device.location,
        "Acquiring camera"
    );
    driver.open(&device, request, on_event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str, location: CameraLocation) -> CameraDevice {
        CameraDevice {
            name: path.to_string(),
            path: path.to_string(),
            location,
        }
    }

    fn request(facing: FacingMode) -> ScanRequest {
        ScanRequest {
            facing,
            fps: 10,
            window: None,
            device_path: None,
        }
    }

    #[test]
    fn test_environment_prefers_back() {
        let devices = vec![
            device("/dev/video0", CameraLocation::Front),
            device("/dev/video2", CameraLocation::Back),
        ];
        let selected = select_device(&devices, &request(FacingMode::Environment));
        assert_eq!(selected.map(|d| d.path), Some("/dev/video2".to_string()));
    }

    #[test]
    fn test_environment_falls_back_to_external_then_any() {
        let devices = vec![
            device("/dev/video0", CameraLocation::Front),
            device("/dev/video4", CameraLocation::External),
        ];
        let selected = select_device(&devices, &request(FacingMode::Environment));
        assert_eq!(selected.map(|d| d.path), Some("/dev/video4".to_string()));

        let front_only = vec![device("/dev/video0", CameraLocation::Front)];
        let selected = select_device(&front_only, &request(FacingMode::Environment));
        assert_eq!(selected.map(|d| d.path), Some("/dev/video0".to_string()));
    }

    #[test]
    fn test_explicit_path_wins() {
        let devices = vec![
            device("/dev/video0", CameraLocation::Front),
            device("/dev/video2", CameraLocation::Back),
        ];
        let mut req = request(FacingMode::Environment);
        req.device_path = Some("/dev/video0".into());
        assert_eq!(
            select_device(&devices, &req).map(|d| d.path),
            Some("/dev/video0".to_string())
        );

        req.device_path = Some("/dev/video9".into());
        assert!(select_device(&devices, &req).is_none());
    }

    #[test]
    fn test_no_devices() {
        assert!(select_device(&[], &request(FacingMode::User)).is_none());
    }
}
