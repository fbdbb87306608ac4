// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera driver
//!
//! Presents an image file as a camera that shows the same frame forever.
//! Used for scanning symbols from screenshots or saved exports, and as a
//! deterministic source in tests.

use super::frame_loop::{CaptureLoopController, FrameThrottle, LoopAction};
use super::types::*;
use super::{CameraDriver, CameraStream};
use crate::app::frame_processor::FrameScanner;
use crate::constants::scan;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::info;

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path.display().to_string()));
    }
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from(io),
        other => BackendError::FormatNotSupported(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    let data: Vec<u8> = rgba.into_raw();

    info!(width, height, "Image loaded successfully");

    Ok(CameraFrame {
        data: Arc::from(data.into_boxed_slice()),
        width,
        height,
        stride: width * 4, // RGBA = 4 bytes per pixel
        format: PixelFormat::RGBA,
        captured_at: Instant::now(),
    })
}

/// Camera driver that replays a single image file
#[derive(Debug, Clone)]
pub struct ImageFileDriver {
    path: PathBuf,
}

impl ImageFileDriver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn device(&self) -> CameraDevice {
        CameraDevice {
            name: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "image".to_string()),
            path: self.path.display().to_string(),
            location: CameraLocation::External,
        }
    }
}

impl CameraDriver for ImageFileDriver {
    fn name(&self) -> &'static str {
        "image-file"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    /// The whole image is decoded; a recognition window is meant for live
    /// framing and would cut symbols out of arbitrary images.
    fn open(
        &self,
        device: &CameraDevice,
        request: &ScanRequest,
        on_event: DecodeCallback,
    ) -> BackendResult<Box<dyn CameraStream>> {
        let path = PathBuf::from(&device.path);
        let mut scanner = FrameScanner::new(None);
        let mut throttle = FrameThrottle::new(request.fps);
        let closing = Arc::new(AtomicBool::new(false));
        let closing_loop = Arc::clone(&closing);

        let controller = CaptureLoopController::start_with_init(
            &format!("image-scan:{}", device.name),
            scan::START_TIMEOUT,
            move || load_image_as_frame(&path),
            move |frame: &mut CameraFrame| {
                throttle.wait(&closing_loop);
                if closing_loop.load(Ordering::SeqCst) {
                    return LoopAction::Stop;
                }
                on_event(scanner.scan(frame));
                LoopAction::Continue
            },
        )?;

        Ok(Box::new(ImageStream {
            device: device.clone(),
            controller,
            closing,
        }))
    }
}

struct ImageStream {
    device: CameraDevice,
    controller: CaptureLoopController,
    /// Wakes the loop out of its frame-interval sleep
    closing: Arc<AtomicBool>,
}

impl CameraStream for ImageStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    fn close(mut self: Box<Self>) -> BackendResult<()> {
        info!(path = %self.device.path, "Closing image scan stream");
        self.closing.store(true, Ordering::SeqCst);
        self.controller.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::export::rasterize;
    use crate::symbol::{Color, QrEncoder, RenderParams, SymbolEncoder};
    use std::sync::Mutex;
    use std::time::Duration;

    fn request() -> ScanRequest {
        ScanRequest {
            facing: FacingMode::Environment,
            fps: 50,
            window: Some(RecognitionWindow::square(10)),
            device_path: None,
        }
    }

    fn write_symbol(dir: &Path, text: &str) -> PathBuf {
        let symbol = QrEncoder.encode(text, &RenderParams::printable()).unwrap();
        let img = rasterize(&symbol, 256, 256, Color::WHITE).unwrap();
        let path = dir.join("symbol.png");
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let driver = ImageFileDriver::new("/nonexistent/symbol.png");
        let device = driver.enumerate_cameras().remove(0);
        let result = driver.open(&device, &request(), Arc::new(|_: DecodeEvent| {}));
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[test]
    fn test_decodes_whole_image_despite_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_symbol(dir.path(), "from a file");
        let driver = ImageFileDriver::new(&path);
        let device = driver.enumerate_cameras().remove(0);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let stream = driver
            .open(
                &device,
                &request(),
                Arc::new(move |event: DecodeEvent| sink.lock().unwrap().push(event)),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while events.lock().unwrap().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        stream.close().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            events.first(),
            Some(&DecodeEvent::Decoded("from a file".to_string()))
        );
    }

    #[test]
    fn test_close_stops_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_symbol(dir.path(), "x");
        let driver = ImageFileDriver::new(&path);
        let device = driver.enumerate_cameras().remove(0);
        let slow = ScanRequest { fps: 1, ..request() };

        let stream = driver.open(&device, &slow, Arc::new(|_: DecodeEvent| {})).unwrap();
        assert!(stream.is_running());

        let started = Instant::now();
        stream.close().unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
