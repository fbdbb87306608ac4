// SPDX-License-Identifier: MPL-2.0

//! Encode a payload, render it the way the app does, and read it back

use qr_studio::app::frame_processor::qr_detector::QrDetector;
use qr_studio::app::{AppModel, CameraSessionState, Message, Mode, Runtime, Services};
use qr_studio::backends::camera::ImageFileDriver;
use qr_studio::backends::clipboard::SystemClipboard;
use qr_studio::config::Config;
use qr_studio::constants::export;
use qr_studio::pipelines::export::{ExportFormat, ExportRequest, rasterize};
use qr_studio::symbol::{Color, QrEncoder, RenderParams, SymbolEncoder};
use std::sync::Arc;
use std::time::Duration;

fn background() -> Color {
    Color::from_hex(export::BACKGROUND).unwrap()
}

fn decode_raster(text: &str, params: RenderParams) -> Vec<String> {
    let symbol = QrEncoder.encode(text, &params).unwrap();
    let image = rasterize(&symbol, 512, 512, background()).unwrap();
    let luma = image::DynamicImage::ImageRgba8(image).to_luma8();
    QrDetector::new()
        .detect(luma.as_raw(), luma.width(), luma.height())
        .into_iter()
        .map(|d| d.content)
        .collect()
}

#[test]
fn test_roundtrip_preview_colors() {
    // Light modules on a dark export background
    assert_eq!(
        decode_raster("https://example.com", RenderParams::preview()),
        vec!["https://example.com".to_string()]
    );
}

#[test]
fn test_roundtrip_printable() {
    assert_eq!(
        decode_raster("hello world", RenderParams::printable()),
        vec!["hello world".to_string()]
    );
}

#[test]
fn test_roundtrip_longer_payload() {
    let text = "The quick brown fox jumps over the lazy dog 0123456789";
    assert_eq!(
        decode_raster(text, RenderParams::preview()),
        vec![text.to_string()]
    );
}

#[tokio::test]
async fn test_exported_file_scans_back() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = QrEncoder
        .encode("https://example.com", &RenderParams::preview())
        .unwrap();
    let request = ExportRequest {
        format: ExportFormat::Png,
        size: 512,
        background: background(),
        path: dir.path().join("qrcode.png"),
    };
    let path = qr_studio::pipelines::export::export(symbol, request)
        .await
        .unwrap();

    let model = AppModel::new(Config::default(), Arc::new(QrEncoder));
    let services = Services {
        driver: Arc::new(ImageFileDriver::new(path)),
        clipboard: Arc::new(SystemClipboard::new()),
    };
    let mut runtime = Runtime::new(model, services);

    runtime.dispatch(Message::SelectMode(Mode::Scan));
    runtime.dispatch(Message::StartScan);
    assert!(
        runtime
            .run_until(
                |m| m.scan.session.result().is_some()
                    && m.scan.session.state() == CameraSessionState::Idle,
                Duration::from_secs(10),
            )
            .await
    );

    let result = runtime.model().scan.session.result().unwrap();
    assert_eq!(result.text, "https://example.com");
    assert!(result.is_link());
}
