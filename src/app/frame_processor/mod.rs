// SPDX-License-Identifier: MPL-2.0

//! Frame processor for camera scanning
//!
//! Drivers hand every admitted frame to a [`FrameScanner`], which crops it to
//! the recognition window, runs the detector and turns the outcome into a
//! [`DecodeEvent`].

pub mod tasks;
pub mod types;

pub use tasks::qr_detector;
pub use types::{QrDetection, ScanResult, parse_link};

use crate::backends::camera::{CameraFrame, DecodeEvent, RecognitionWindow};
use crate::constants::scan;
use tasks::QrDetector;
use tracing::{debug, warn};

/// Per-stream decoding state
#[derive(Debug)]
pub struct FrameScanner {
    detector: QrDetector,
    window: Option<RecognitionWindow>,
    frames: u64,
}

impl FrameScanner {
    pub fn new(window: Option<RecognitionWindow>) -> Self {
        Self {
            detector: QrDetector::new(),
            window,
            frames: 0,
        }
    }

    /// Decode one frame
    ///
    /// Frames whose buffer does not match their geometry are dropped as
    /// `NoSymbol`; a single short buffer is not worth ending the stream.
    pub fn scan(&mut self, frame: &CameraFrame) -> DecodeEvent {
        self.frames += 1;
        if self.frames % scan::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frames = self.frames,
                width = frame.width,
                height = frame.height,
                "Scanning frames"
            );
        }

        let (x, y, w, h) = match self.window {
            Some(window) => window.centered_in(frame.width, frame.height),
            None => (0, 0, frame.width, frame.height),
        };
        let Some(luma) = frame.luma_region(x, y, w, h) else {
            warn!(
                width = frame.width,
                height = frame.height,
                len = frame.data.len(),
                "Dropping malformed frame"
            );
            return DecodeEvent::NoSymbol;
        };

        match self.detector.detect(&luma, w, h).into_iter().next() {
            Some(detection) => DecodeEvent::Decoded(detection.content),
            None => DecodeEvent::NoSymbol,
        }
    }
}
