// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 capture driver
//!
//! Opens the device on the capture thread, negotiates a small YUYV (or
//! GREY/MJPG) format and decodes frames at the requested rate.

use super::frame_loop::{CaptureLoopController, FrameThrottle, LoopAction};
use super::types::*;
use super::{CameraDriver, CameraStream};
use crate::app::frame_processor::FrameScanner;
use crate::constants::scan;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Consecutive capture errors tolerated before the stream is declared faulty
const MAX_CAPTURE_ERRORS: u32 = 10;

/// Pixel layouts the driver can turn into luminance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    Yuyv,
    Grey,
    Mjpg,
}

impl WireFormat {
    fn from_fourcc(fourcc: v4l::FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"GREY" => Some(Self::Grey),
            b"MJPG" => Some(Self::Mjpg),
            _ => None,
        }
    }
}

/// Camera driver backed by `/dev/video*` nodes
#[derive(Debug, Default, Clone, Copy)]
pub struct V4l2Driver;

impl V4l2Driver {
    pub fn new() -> Self {
        Self
    }
}

impl CameraDriver for V4l2Driver {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node.index());

        nodes
            .into_iter()
            .filter_map(|node| {
                let path = node.path().to_string_lossy().to_string();
                let dev = match Device::with_path(&path) {
                    Ok(dev) => dev,
                    Err(e) => {
                        debug!(path = %path, error = %e, "Skipping unreadable device");
                        return None;
                    }
                };
                let caps = dev.query_caps().ok()?;
                // Metadata nodes share the card name but cannot capture
                if !caps
                    .capabilities
                    .contains(v4l::capability::Flags::VIDEO_CAPTURE)
                {
                    return None;
                }
                let location = guess_location(&caps.card);
                debug!(path = %path, card = %caps.card, %location, "Found capture device");
                Some(CameraDevice {
                    name: caps.card,
                    path,
                    location,
                })
            })
            .collect()
    }

    fn open(
        &self,
        device: &CameraDevice,
        request: &ScanRequest,
        on_event: DecodeCallback,
    ) -> BackendResult<Box<dyn CameraStream>> {
        let path = device.path.clone();
        let fps = request.fps;
        let mut scanner = FrameScanner::new(request.window);

        info!(device = %device.name, path = %path, fps, "Opening V4L2 scan stream");

        let mut throttle = FrameThrottle::new(fps);
        let mut errors = 0u32;
        let controller = CaptureLoopController::start_with_init(
            &format!("v4l2-scan:{}", path),
            scan::START_TIMEOUT,
            move || open_stream(&path, fps),
            move |state: &mut StreamState| match state.stream.next() {
                Ok((buf, _meta)) => {
                    errors = 0;
                    if !throttle.admit() {
                        return LoopAction::Continue;
                    }
                    match state.layout.to_frame(buf) {
                        Some(frame) => on_event(scanner.scan(&frame)),
                        None => debug!(len = buf.len(), "Dropped undecodable frame"),
                    }
                    LoopAction::Continue
                }
                Err(e) => {
                    errors += 1;
                    warn!(error = %e, errors, "Failed to capture frame");
                    if errors >= MAX_CAPTURE_ERRORS {
                        on_event(DecodeEvent::Fault(format!("capture failed: {}", e)));
                        return LoopAction::Stop;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    LoopAction::Continue
                }
            },
        )?;

        Ok(Box::new(V4l2Stream {
            device: device.clone(),
            controller,
        }))
    }
}

/// Device resources owned by the capture thread
struct StreamState {
    stream: MmapStream<'static>,
    layout: FrameLayout,
}

/// Negotiated geometry of the buffers the device delivers
#[derive(Debug, Clone, Copy)]
struct FrameLayout {
    format: WireFormat,
    width: u32,
    height: u32,
    stride: u32,
}

impl FrameLayout {
    fn to_frame(&self, buf: &[u8]) -> Option<CameraFrame> {
        let captured_at = Instant::now();
        match self.format {
            WireFormat::Yuyv | WireFormat::Grey => {
                let format = if self.format == WireFormat::Yuyv {
                    PixelFormat::YUYV
                } else {
                    PixelFormat::Gray8
                };
                Some(CameraFrame {
                    width: self.width,
                    height: self.height,
                    data: buf.into(),
                    format,
                    stride: self.stride,
                    captured_at,
                })
            }
            WireFormat::Mjpg => {
                let decoded =
                    image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg).ok()?;
                let gray = decoded.to_luma8();
                let (width, height) = gray.dimensions();
                Some(CameraFrame {
                    width,
                    height,
                    data: gray.into_raw().into(),
                    format: PixelFormat::Gray8,
                    stride: width,
                    captured_at,
                })
            }
        }
    }
}

fn open_stream(path: &str, fps: u32) -> BackendResult<StreamState> {
    let dev = Device::with_path(path)?;

    let mut format = dev.format()?;
    format.width = scan::CAPTURE_WIDTH;
    format.height = scan::CAPTURE_HEIGHT;
    format.fourcc = v4l::FourCC::new(b"YUYV");

    let format = match dev.set_format(&format) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "Could not set format, using current device format");
            dev.format()?
        }
    };
    let wire = WireFormat::from_fourcc(format.fourcc).ok_or_else(|| {
        BackendError::FormatNotSupported(format!("{} delivers {}", path, format.fourcc))
    })?;
    info!(
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        "Negotiated V4L2 format"
    );

    if let Err(e) = dev.set_params(&v4l::video::capture::Parameters::with_fps(fps.max(1))) {
        debug!(error = %e, "Device does not accept a frame interval");
    }

    let bpp = if wire == WireFormat::Yuyv { 2 } else { 1 };
    let stride = if format.stride > 0 {
        format.stride
    } else {
        format.width * bpp
    };

    let stream = MmapStream::with_buffers(&dev, Type::VideoCapture, scan::CAPTURE_BUFFERS)?;
    info!(path, "V4L2 capture stream started");

    Ok(StreamState {
        stream,
        layout: FrameLayout {
            format: wire,
            width: format.width,
            height: format.height,
            stride,
        },
    })
}

/// Mount location from the card name; unknown cameras count as external
fn guess_location(card: &str) -> CameraLocation {
    let card = card.to_lowercase();
    if card.contains("front") || card.contains("user") {
        CameraLocation::Front
    } else if card.contains("back") || card.contains("rear") || card.contains("world") {
        CameraLocation::Back
    } else if card.contains("integrated") {
        // Laptop bezel cameras face the user
        CameraLocation::Front
    } else {
        CameraLocation::External
    }
}

struct V4l2Stream {
    device: CameraDevice,
    controller: CaptureLoopController,
}

impl CameraStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    fn close(mut self: Box<Self>) -> BackendResult<()> {
        info!(path = %self.device.path, "Closing V4L2 scan stream");
        self.controller.stop();
        Ok(())
    }
}
