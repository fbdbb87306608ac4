// SPDX-License-Identifier: GPL-3.0-only

//! Symbol encoding
//!
//! The encoder turns a text payload into a [`RenderedSymbol`]: a module grid
//! plus the parameters it should be drawn with. Rendering parameters travel
//! with the grid so the preview, the SVG serializer and the export rasterizer
//! all draw the same thing.

mod svg;

use crate::constants::render;
use crate::errors::EncodeError;
use std::sync::Arc;
use tracing::debug;

/// Error-correction level, trading capacity for damage tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcLevel {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery
    #[default]
    High,
}

impl EcLevel {
    fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            EcLevel::Low => qrcode::EcLevel::L,
            EcLevel::Medium => qrcode::EcLevel::M,
            EcLevel::Quartile => qrcode::EcLevel::Q,
            EcLevel::High => qrcode::EcLevel::H,
        }
    }
}

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// `#rrggbb`, alpha dropped
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Perceived brightness (BT.601), 0..=255
    pub fn luma(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

/// Square grid of dark/light modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Build from row-major dark flags; `None` if the data is not a square
    pub fn new(width: usize, modules: Vec<bool>) -> Option<Self> {
        (width > 0 && modules.len() == width * width).then_some(Self { width, modules })
    }

    /// Modules per side
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }
}

/// How a symbol is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    /// Side length in pixels (symbols are always square)
    pub size: u32,
    pub foreground: Color,
    pub background: Color,
    pub ec_level: EcLevel,
    /// Quiet zone in modules
    pub margin: u32,
}

impl RenderParams {
    /// The fixed on-screen request: themed modules on a transparent
    /// background, highest EC level, no quiet zone
    pub fn preview() -> Self {
        Self {
            size: render::PREVIEW_SIZE,
            foreground: Color::from_hex(render::FOREGROUND).unwrap_or(Color::BLACK),
            background: Color::TRANSPARENT,
            ec_level: EcLevel::High,
            margin: 0,
        }
    }

    /// Black on white with a standard quiet zone, for printing
    pub fn printable() -> Self {
        Self {
            size: render::PREVIEW_SIZE,
            foreground: Color::BLACK,
            background: Color::WHITE,
            ec_level: EcLevel::High,
            margin: render::PRINTABLE_MARGIN,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::preview()
    }
}

/// Vector symbol: module grid plus rendering parameters
///
/// Cheap to clone; the grid is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSymbol {
    grid: Arc<ModuleGrid>,
    params: RenderParams,
}

impl RenderedSymbol {
    pub fn new(grid: ModuleGrid, params: RenderParams) -> Self {
        Self {
            grid: Arc::new(grid),
            params,
        }
    }

    pub fn grid(&self) -> &ModuleGrid {
        &self.grid
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Modules per side including the quiet zone
    pub fn total_modules(&self) -> usize {
        self.grid.width() + 2 * self.params.margin as usize
    }

    /// Dark test in quiet-zone-inclusive coordinates
    pub fn is_dark_at(&self, x: usize, y: usize) -> bool {
        let margin = self.params.margin as usize;
        x >= margin && y >= margin && self.grid.is_dark(x - margin, y - margin)
    }

    /// Same grid drawn with different parameters
    pub fn with_params(&self, params: RenderParams) -> Self {
        Self {
            grid: Arc::clone(&self.grid),
            params,
        }
    }

    /// Serialize to a standalone SVG document
    pub fn to_svg(&self) -> String {
        svg::render(self)
    }
}

/// Text-to-symbol capability
pub trait SymbolEncoder: Send + Sync {
    fn encode(&self, text: &str, params: &RenderParams) -> Result<RenderedSymbol, EncodeError>;
}

/// QR Model 2 encoder backed by the `qrcode` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl SymbolEncoder for QrEncoder {
    fn encode(&self, text: &str, params: &RenderParams) -> Result<RenderedSymbol, EncodeError> {
        let code = qrcode::QrCode::with_error_correction_level(
            text.as_bytes(),
            params.ec_level.to_qrcode(),
        )
        .map_err(|e| match e {
            qrcode::types::QrError::DataTooLong => EncodeError::DataTooLong,
            other => EncodeError::Failed(other.to_string()),
        })?;

        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        let grid = ModuleGrid::new(width, modules)
            .ok_or_else(|| EncodeError::Failed("encoder returned a non-square grid".into()))?;

        debug!(
            payload_bytes = text.len(),
            modules = width,
            "Encoded symbol"
        );

        Ok(RenderedSymbol::new(grid, *params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#0f1419"), Some(Color::rgb(0x0f, 0x14, 0x19)));
        assert_eq!(
            Color::from_hex("24dbc980"),
            Some(Color::rgba(0x24, 0xdb, 0xc9, 0x80))
        );
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::rgb(0x24, 0xdb, 0xc9).to_hex(), "#24dbc9");
    }

    #[test]
    fn test_preview_params_are_fixed() {
        let params = RenderParams::preview();
        assert_eq!(params.ec_level, EcLevel::High);
        assert_eq!(params.margin, 0);
        assert!(params.background.is_transparent());
        assert_eq!(params.foreground, Color::rgb(0x24, 0xdb, 0xc9));
    }

    #[test]
    fn test_encode_produces_square_grid() {
        let symbol = QrEncoder
            .encode("hello world", &RenderParams::preview())
            .unwrap();
        let width = symbol.grid().width();
        // Version 1..=40 sizes are 21 + 4k
        assert!(width >= 21 && (width - 21) % 4 == 0);
        assert!(symbol.grid().dark_count() > 0);
        // Top-left finder pattern corner is always dark
        assert!(symbol.grid().is_dark(0, 0));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = QrEncoder.encode("same", &RenderParams::preview()).unwrap();
        let b = QrEncoder.encode("same", &RenderParams::preview()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_too_long() {
        let text = "x".repeat(4000);
        assert_eq!(
            QrEncoder.encode(&text, &RenderParams::preview()),
            Err(EncodeError::DataTooLong)
        );
    }

    #[test]
    fn test_margin_offsets_modules() {
        let symbol = QrEncoder.encode("m", &RenderParams::printable()).unwrap();
        let margin = symbol.params().margin as usize;
        assert_eq!(symbol.total_modules(), symbol.grid().width() + 2 * margin);
        assert!(!symbol.is_dark_at(0, 0));
        assert!(symbol.is_dark_at(margin, margin));
    }

    #[test]
    fn test_module_grid_rejects_bad_shape() {
        assert!(ModuleGrid::new(0, vec![]).is_none());
        assert!(ModuleGrid::new(2, vec![true; 3]).is_none());
        assert!(ModuleGrid::new(2, vec![true; 4]).is_some());
    }
}
