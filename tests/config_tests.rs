// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use qr_studio::Config;
use qr_studio::backends::camera::FacingMode;
use std::time::Duration;

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.scan_fps, 10, "Scanning should target 10 fps");
    assert_eq!(config.scan_window, 250);
    assert_eq!(config.export_size, 512);
    assert!(config.camera_path.is_none());
}

#[test]
fn test_default_scan_prefers_back_camera() {
    let request = Config::default().scan_request();
    assert_eq!(request.facing, FacingMode::Environment);
    assert!(request.device_path.is_none());
}

#[test]
fn test_feedback_window() {
    let config = Config {
        feedback_window_ms: 250,
        ..Config::default()
    };
    assert_eq!(config.feedback_window(), Duration::from_millis(250));
    assert_eq!(Config::default().feedback_window(), Duration::from_secs(2));
}

#[test]
fn test_configured_export_dir_wins() {
    let config = Config {
        export_dir: Some("/srv/codes".into()),
        ..Config::default()
    };
    assert_eq!(config.export_dir(), std::path::PathBuf::from("/srv/codes"));
}
