// SPDX-License-Identifier: GPL-3.0-only

//! Symbol export pipeline
//!
//! Turns a [`RenderedSymbol`] into a file:
//! - PNG: rasterized onto an opaque surface of the requested size
//! - SVG: the vector symbol as-is
//!
//! Rasterizing and encoding run on the blocking pool. The output file is
//! written through a temporary sibling so a failed export never leaves a
//! partial file behind.

use crate::errors::ExportError;
use crate::storage;
use crate::symbol::{Color, RenderedSymbol};
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Opaque raster image
    Png,
    /// Vector image, keeps the symbol's own background
    Svg,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }
}

/// What to export and where
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Raster side length (ignored for SVG)
    pub size: u32,
    /// Opaque fill painted before the symbol
    pub background: Color,
    pub path: PathBuf,
}

/// Render `symbol` onto an opaque `width` x `height` surface
///
/// The surface is filled with `background` first, then the symbol's own
/// background and modules are composited over it, so the result is opaque
/// even when the symbol is drawn on a transparent background. The symbol
/// (quiet zone included) is stretched to cover the whole surface.
pub fn rasterize(
    symbol: &RenderedSymbol,
    width: u32,
    height: u32,
    background: Color,
) -> Result<RgbaImage, ExportError> {
    if width == 0
        || height == 0
        || width > crate::constants::export::MAX_SURFACE
        || height > crate::constants::export::MAX_SURFACE
    {
        return Err(ExportError::SurfaceUnavailable { width, height });
    }
    if symbol.grid().width() == 0 {
        return Err(ExportError::InvalidSymbol("empty module grid".into()));
    }

    let params = symbol.params();
    let base = over(Color { a: 255, ..background }, params.background);
    let dark = over(base, params.foreground);
    let total = symbol.total_modules() as u64;

    let img = RgbaImage::from_fn(width, height, |x, y| {
        let mx = (x as u64 * total / width as u64) as usize;
        let my = (y as u64 * total / height as u64) as usize;
        let c = if symbol.is_dark_at(mx, my) { dark } else { base };
        Rgba([c.r, c.g, c.b, c.a])
    });

    debug!(width, height, modules = total, "Rasterized symbol");
    Ok(img)
}

/// Source-over compositing of `src` onto an opaque `dst`
fn over(dst: Color, src: Color) -> Color {
    let a = src.a as u32;
    let blend = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
    Color::rgb(blend(src.r, dst.r), blend(src.g, dst.g), blend(src.b, dst.b))
}

/// Encode an image as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Produce the file bytes for `request`
pub fn render_bytes(symbol: &RenderedSymbol, request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
    match request.format {
        ExportFormat::Png => {
            let img = rasterize(symbol, request.size, request.size, request.background)?;
            encode_png(&img)
        }
        ExportFormat::Svg => {
            if symbol.grid().width() == 0 {
                return Err(ExportError::InvalidSymbol("empty module grid".into()));
            }
            Ok(symbol.to_svg().into_bytes())
        }
    }
}

/// Render and write `symbol` according to `request`
///
/// # Returns
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(ExportError)` - Nothing was written; an existing file is untouched
pub async fn export(symbol: RenderedSymbol, request: ExportRequest) -> Result<PathBuf, ExportError> {
    info!(
        path = %request.path.display(),
        format = ?request.format,
        size = request.size,
        "Starting export"
    );

    let render_request = request.clone();
    let bytes = tokio::task::spawn_blocking(move || render_bytes(&symbol, &render_request))
        .await
        .map_err(|e| ExportError::EncodingFailed(format!("render task error: {}", e)))??;

    storage::write_atomic(&request.path, &bytes).await?;

    info!(path = %request.path.display(), bytes = bytes.len(), "Export saved");
    Ok(request.path)
}

/// `dir/name`, or `dir/name-N.ext` for the first N that does not exist yet
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };
    (1u32..)
        .map(|n| dir.join(format!("{}-{}{}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
