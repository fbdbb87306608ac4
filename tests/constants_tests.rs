// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use qr_studio::constants::{export, messages, render, scan};
use qr_studio::symbol::{Color, EcLevel, RenderParams};

#[test]
fn test_theme_colors_parse() {
    // Test that the configured colors are valid hex
    assert!(Color::from_hex(render::FOREGROUND).is_some());
    assert!(Color::from_hex(export::BACKGROUND).is_some_and(|c| c.is_opaque()));
}

#[test]
fn test_preview_params() {
    let params = RenderParams::preview();
    assert_eq!(params.size, render::PREVIEW_SIZE);
    assert_eq!(params.ec_level, EcLevel::High);
    assert_eq!(params.margin, 0);
    assert!(params.background.is_transparent());
}

#[test]
fn test_export_size_fits_surface() {
    assert!(export::SIZE > 0);
    assert!(export::SIZE <= export::MAX_SURFACE);
}

#[test]
fn test_recognition_window_fits_capture() {
    assert!(scan::RECOGNITION_WINDOW <= scan::CAPTURE_WIDTH);
    assert!(scan::RECOGNITION_WINDOW <= scan::CAPTURE_HEIGHT);
}

#[test]
fn test_default_filenames() {
    assert!(export::DEFAULT_FILENAME.ends_with(".png"));
    assert!(export::DEFAULT_SVG_FILENAME.ends_with(".svg"));
    for message in [
        messages::CAMERA_UNAVAILABLE,
        messages::SCAN_SUCCESS,
        messages::DOWNLOADED,
        messages::INVALID_URL,
    ] {
        assert!(!message.is_empty());
    }
}
