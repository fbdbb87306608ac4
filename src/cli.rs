// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Generating a QR code file
//! - Scanning a single QR code from a camera or an image file
//! - Showing the effective configuration

use qr_studio::app::{
    AppModel, CameraSessionState, Message, Mode, NotificationLevel, Runtime, Services,
};
use qr_studio::backends::camera::{CameraDriver, ImageFileDriver, V4l2Driver};
use qr_studio::backends::clipboard::SystemClipboard;
use qr_studio::config::Config;
use qr_studio::constants::{export, timing};
use qr_studio::pipelines::export::{ExportFormat, ExportRequest, unique_path};
use qr_studio::symbol::{Color, QrEncoder, RenderParams, SymbolEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = V4l2Driver::new().enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Device: {} ({})", camera.path, camera.location);
    }

    Ok(())
}

/// Encode `text` and write it as PNG or SVG
pub fn generate(
    config: &Config,
    text: &str,
    output: Option<PathBuf>,
    svg: bool,
    size: Option<u32>,
    printable: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if text.is_empty() {
        return Err("Nothing to encode".into());
    }

    let size = size.unwrap_or(config.export_size);
    let base = if printable {
        RenderParams::printable()
    } else {
        RenderParams::preview()
    };
    let params = RenderParams { size, ..base };
    let symbol = QrEncoder.encode(text, &params)?;

    let format = if svg { ExportFormat::Svg } else { ExportFormat::Png };
    let path = match output {
        Some(path) if path.is_dir() => unique_path(&path, default_filename(format)),
        Some(path) => path,
        None => unique_path(&config.export_dir(), default_filename(format)),
    };
    let request = ExportRequest {
        format,
        size,
        background: Color::from_hex(export::BACKGROUND).unwrap_or(Color::BLACK),
        path,
    };

    println!(
        "Encoding {} characters ({}x{} modules)",
        text.chars().count(),
        symbol.grid().width(),
        symbol.grid().width()
    );

    let rt = tokio::runtime::Runtime::new()?;
    let saved = rt.block_on(qr_studio::pipelines::export::export(symbol, request))?;
    println!("QR code saved: {}", saved.display());
    Ok(())
}

fn default_filename(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Png => export::DEFAULT_FILENAME,
        ExportFormat::Svg => export::DEFAULT_SVG_FILENAME,
    }
}

/// Run one scan session to completion
pub fn scan(
    mut config: Config,
    camera_index: Option<usize>,
    image: Option<PathBuf>,
    timeout: u64,
    copy: bool,
    open: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let driver: Arc<dyn CameraDriver> = match image {
        Some(path) => Arc::new(ImageFileDriver::new(path)),
        None => Arc::new(V4l2Driver::new()),
    };

    if let Some(index) = camera_index {
        let cameras = driver.enumerate_cameras();
        if cameras.is_empty() {
            return Err("No cameras found".into());
        }
        let camera = cameras.get(index).ok_or_else(|| {
            format!(
                "Camera index {} out of range (0-{})",
                index,
                cameras.len() - 1
            )
        })?;
        println!("Using camera: {}", camera.name);
        config.camera_path = Some(camera.path.clone());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let model = AppModel::new(config, Arc::new(QrEncoder));
    let services = Services {
        driver,
        clipboard: Arc::new(SystemClipboard::new()),
    };
    let mut runtime = Runtime::new(model, services);

    // Set up Ctrl+C handler
    let stop = runtime.sender();
    ctrlc::set_handler(move || {
        let _ = stop.send(Message::StopScan);
    })?;

    runtime.dispatch(Message::SelectMode(Mode::Scan));
    runtime.dispatch(Message::StartScan);
    println!("Scanning... (press Ctrl+C to stop)");

    let settled = rt.block_on(runtime.run_until(
        |model| {
            matches!(
                model.scan.session.state(),
                CameraSessionState::Idle | CameraSessionState::Error
            )
        },
        Duration::from_secs(timeout),
    ));

    let outcome = match runtime.model().scan.session.result() {
        Some(result) => {
            println!("{}", result.text);
            Ok(())
        }
        None if !settled => Err(format!("No QR code found within {} seconds", timeout)),
        None => match runtime.model().scan.session.error_message() {
            Some(message) => Err(message.to_string()),
            None => Err("Scan stopped".to_string()),
        },
    };

    if outcome.is_ok() {
        if copy {
            rt.block_on(run_action(&mut runtime, Message::CopyResult));
        }
        if open {
            rt.block_on(run_action(&mut runtime, Message::OpenLink));
        }
    }

    rt.block_on(runtime.shutdown(timing::SHUTDOWN_TIMEOUT));
    Ok(outcome?)
}

/// Dispatch a result action and report the notification it produces
async fn run_action(runtime: &mut Runtime, message: Message) {
    let before = runtime.model().notifications.len();
    let latest = |model: &AppModel| model.latest_notification().map(|n| n.at);
    let previous = latest(runtime.model());

    runtime.dispatch(message);
    let done = runtime
        .run_until(
            |model| model.notifications.len() != before || latest(model) != previous,
            Duration::from_secs(5),
        )
        .await;

    if !done {
        eprintln!("No response from the desktop");
        return;
    }
    if let Some(notification) = runtime.model().latest_notification() {
        match notification.level {
            NotificationLevel::Error => eprintln!("{}", notification.message),
            _ => println!("{}", notification.message),
        }
    }
}

/// Print the configuration in effect, optionally creating the file
pub fn show_config(
    config: &Config,
    path: Option<PathBuf>,
    init: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.or_else(Config::path);

    match &path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory)"),
    }

    if init && let Some(path) = &path {
        if path.exists() {
            println!("Config file already exists, leaving it untouched");
        } else {
            config.save_to(path)?;
            println!("Wrote defaults");
        }
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
