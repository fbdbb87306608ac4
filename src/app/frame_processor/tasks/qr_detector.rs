// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! Detection runs on 8-bit luminance. Each image is padded with a light
//! border so symbols touching the edge of the recognition window still
//! have a quiet zone. Light-on-dark symbols are found by retrying on the
//! inverted image when the direct pass decodes nothing.

use crate::app::frame_processor::types::QrDetection;
use crate::constants::scan;
use tracing::{debug, trace};

/// Light border added around every image, in pixels
const QUIET_BORDER: u32 = 8;

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: scan::MAX_PROCESS_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Detect and decode symbols in a tightly packed luminance image
    pub fn detect(&self, luma: &[u8], width: u32, height: u32) -> Vec<QrDetection> {
        if width == 0 || height == 0 || luma.len() < (width * height) as usize {
            return Vec::new();
        }
        let start = std::time::Instant::now();

        let (pixels, proc_width, proc_height) =
            if width > self.max_dimension || height > self.max_dimension {
                let scale = (width as f32 / self.max_dimension as f32)
                    .max(height as f32 / self.max_dimension as f32);
                let new_width = ((width as f32 / scale) as u32).max(1);
                let new_height = ((height as f32 / scale) as u32).max(1);
                (
                    downscale_gray(luma, width, height, new_width, new_height),
                    new_width,
                    new_height,
                )
            } else {
                (luma[..(width * height) as usize].to_vec(), width, height)
            };

        let mut detections = detect_padded(&pixels, proc_width, proc_height, false);
        if detections.is_empty() {
            detections = detect_padded(&pixels, proc_width, proc_height, true);
            if !detections.is_empty() {
                trace!("Decoded on inverted luminance");
            }
        }

        if !detections.is_empty() {
            debug!(
                count = detections.len(),
                total_ms = start.elapsed().as_millis(),
                "QR detection found codes"
            );
        }
        detections
    }
}

fn detect_padded(pixels: &[u8], width: u32, height: u32, invert: bool) -> Vec<QrDetection> {
    let padded_width = (width + 2 * QUIET_BORDER) as usize;
    let padded_height = (height + 2 * QUIET_BORDER) as usize;
    let border = QUIET_BORDER as usize;
    let w = width as usize;
    let h = height as usize;

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(padded_width, padded_height, |x, y| {
            if x < border || y < border || x >= border + w || y >= border + h {
                return 255;
            }
            let value = pixels[(y - border) * w + (x - border)];
            if invert { 255 - value } else { value }
        });

    let mut detections = Vec::new();
    for grid in prepared.detect_grids() {
        let content = match grid.decode() {
            Ok((_meta, content)) => content,
            Err(e) => {
                debug!(error = %e, "Failed to decode QR code");
                continue;
            }
        };

        detections.push(QrDetection { content });
    }
    detections
}

/// Downscale a luminance image using bilinear interpolation
fn downscale_gray(src: &[u8], src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = src_width as usize;
    let src_height = src_height as usize;
    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;
    let get = |px: usize, py: usize| src.get(py * src_width + px).copied().unwrap_or(0) as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let value = get(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + get(x1, y0) * x_frac * (1.0 - y_frac)
                + get(x0, y1) * (1.0 - x_frac) * y_frac
                + get(x1, y1) * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}
