// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the camera session and the flows around it,
//! driven through the runtime with recording fakes

use qr_studio::app::{
    AppModel, CameraSessionState, Message, Mode, NotificationLevel, Runtime, Services,
};
use qr_studio::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraDriver, CameraLocation, CameraStream,
    DecodeCallback, DecodeEvent, ScanRequest,
};
use qr_studio::backends::clipboard::ClipboardBridge;
use qr_studio::config::Config;
use qr_studio::constants::messages;
use qr_studio::errors::ClipboardError;
use qr_studio::symbol::QrEncoder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Behavior {
    Deny,
    Stream,
}

/// Camera driver that records every handle it opens and closes
struct FakeDriver {
    behavior: Behavior,
    open_delay: Duration,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    callback: Mutex<Option<DecodeCallback>>,
}

impl FakeDriver {
    fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_delay(behavior, Duration::ZERO)
    }

    fn with_delay(behavior: Behavior, open_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            open_delay,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            callback: Mutex::new(None),
        })
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver a decoder event as the capture thread would
    fn emit(&self, event: DecodeEvent) {
        let callback = self.callback.lock().unwrap().clone();
        (callback.expect("stream not opened"))(event);
    }
}

fn back_camera() -> CameraDevice {
    CameraDevice {
        name: "Fake Camera".into(),
        path: "/dev/video-fake".into(),
        location: CameraLocation::Back,
    }
}

impl CameraDriver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![back_camera()]
    }

    fn open(
        &self,
        device: &CameraDevice,
        _request: &ScanRequest,
        on_event: DecodeCallback,
    ) -> BackendResult<Box<dyn CameraStream>> {
        std::thread::sleep(self.open_delay);
        match self.behavior {
            Behavior::Deny => Err(BackendError::PermissionDenied(device.path.clone())),
            Behavior::Stream => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                *self.callback.lock().unwrap() = Some(on_event);
                Ok(Box::new(FakeStream {
                    device: device.clone(),
                    closed: Arc::clone(&self.closed),
                }))
            }
        }
    }
}

struct FakeStream {
    device: CameraDevice,
    closed: Arc<AtomicUsize>,
}

impl CameraStream for FakeStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        true
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Clipboard that records writes, or refuses them
#[derive(Default)]
struct FakeClipboard {
    deny: bool,
    copies: Mutex<Vec<String>>,
}

impl ClipboardBridge for FakeClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        if self.deny {
            return Err(ClipboardError::Denied("not allowed".into()));
        }
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn runtime_with(
    config: Config,
    driver: Arc<FakeDriver>,
    clipboard: Arc<FakeClipboard>,
) -> Runtime {
    let model = AppModel::new(config, Arc::new(QrEncoder));
    Runtime::new(model, Services { driver, clipboard })
}

fn runtime(driver: Arc<FakeDriver>) -> Runtime {
    runtime_with(Config::default(), driver, Arc::new(FakeClipboard::default()))
}

fn state(runtime: &Runtime) -> CameraSessionState {
    runtime.model().scan.session.state()
}

async fn start_active(runtime: &mut Runtime) {
    runtime.dispatch(Message::SelectMode(Mode::Scan));
    runtime.dispatch(Message::StartScan);
    assert_eq!(state(runtime), CameraSessionState::Starting);
    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Active, WAIT)
            .await
    );
}

#[tokio::test]
async fn test_permission_denied_holds_no_device() {
    let driver = FakeDriver::new(Behavior::Deny);
    let mut runtime = runtime(Arc::clone(&driver));

    runtime.dispatch(Message::SelectMode(Mode::Scan));
    runtime.dispatch(Message::StartScan);
    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Error, WAIT)
            .await
    );

    let notification = runtime.model().latest_notification().unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.message, messages::CAMERA_UNAVAILABLE);
    assert_eq!(driver.opened(), driver.closed());
}

#[tokio::test]
async fn test_decode_stops_session() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    // Misses never reach the model
    driver.emit(DecodeEvent::NoSymbol);
    driver.emit(DecodeEvent::Decoded("https://example.com".into()));
    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Idle, WAIT)
            .await
    );

    let result = runtime.model().scan.session.result().unwrap();
    assert_eq!(result.text, "https://example.com");
    assert!(result.is_link());
    assert!(runtime.model().scan.can_open_link());
    assert_eq!(driver.opened(), 1);
    assert_eq!(driver.closed(), 1);
}

#[tokio::test]
async fn test_plain_text_result_offers_no_link() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    driver.emit(DecodeEvent::Decoded("not a url".into()));
    assert!(
        runtime
            .run_until(|m| m.scan.session.result().is_some(), WAIT)
            .await
    );
    assert!(!runtime.model().scan.can_open_link());

    runtime.dispatch(Message::OpenLink);
    assert_eq!(
        runtime.model().latest_notification().map(|n| n.message.as_str()),
        Some(messages::INVALID_URL)
    );
}

#[tokio::test]
async fn test_second_start_waits_for_reset() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    // Rejected while active: still a single open handle
    runtime.dispatch(Message::StartScan);
    driver.emit(DecodeEvent::Decoded("first".into()));
    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Idle, WAIT)
            .await
    );
    assert_eq!(driver.opened(), 1);

    // A pending result blocks the next start
    runtime.dispatch(Message::StartScan);
    assert_eq!(state(&runtime), CameraSessionState::Idle);

    runtime.dispatch(Message::ScanAnother);
    assert!(runtime.model().scan.session.result().is_none());
    runtime.dispatch(Message::StartScan);
    assert_eq!(state(&runtime), CameraSessionState::Starting);
}

#[tokio::test]
async fn test_stop_twice_settles_idle() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    runtime.dispatch(Message::StopScan);
    runtime.dispatch(Message::StopScan);
    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Idle, WAIT)
            .await
    );

    runtime.dispatch(Message::StopScan);
    assert_eq!(state(&runtime), CameraSessionState::Idle);
    assert_eq!(driver.closed(), 1);
}

#[tokio::test]
async fn test_stop_cancels_start_queued_during_teardown() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    runtime.dispatch(Message::StopScan);
    runtime.dispatch(Message::StartScan);
    runtime.dispatch(Message::StopScan);
    assert_eq!(state(&runtime), CameraSessionState::Stopping);

    assert!(
        runtime
            .run_until(|m| m.scan.session.state() == CameraSessionState::Idle, WAIT)
            .await
    );
    // Nothing reopens the camera afterwards
    let _ = runtime.run_until(|_| false, Duration::from_millis(100)).await;
    assert_eq!(state(&runtime), CameraSessionState::Idle);
    assert_eq!(driver.opened(), 1);
    assert_eq!(driver.closed(), 1);
}

#[tokio::test]
async fn test_leaving_scan_releases_camera_first() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    runtime.dispatch(Message::SelectMode(Mode::Generate));
    // Generate is not current until the device is released
    assert_eq!(runtime.model().current_mode(), Mode::Scan);
    assert_eq!(runtime.model().mode.pending(), Some(Mode::Generate));

    assert!(
        runtime
            .run_until(|m| m.current_mode() == Mode::Generate, WAIT)
            .await
    );
    assert_eq!(state(&runtime), CameraSessionState::Idle);
    assert_eq!(driver.closed(), 1);
}

#[tokio::test]
async fn test_leaving_scan_during_acquisition_releases_late_stream() {
    let driver = FakeDriver::with_delay(Behavior::Stream, Duration::from_millis(100));
    let mut runtime = runtime(Arc::clone(&driver));

    runtime.dispatch(Message::SelectMode(Mode::Scan));
    runtime.dispatch(Message::StartScan);
    runtime.dispatch(Message::SelectMode(Mode::Generate));
    assert_eq!(state(&runtime), CameraSessionState::Stopping);

    assert!(
        runtime
            .run_until(|m| m.current_mode() == Mode::Generate, WAIT)
            .await
    );
    assert_eq!(driver.opened(), 1);
    assert_eq!(driver.closed(), 1);
}

#[tokio::test]
async fn test_fault_releases_and_reports() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    driver.emit(DecodeEvent::Fault("device unplugged".into()));
    assert!(
        runtime
            .run_until(
                |m| m.scan.session.state() == CameraSessionState::Error
                    && !m.scan.session.is_busy(),
                WAIT
            )
            .await
    );
    assert_eq!(driver.closed(), 1);
    assert_eq!(
        runtime.model().latest_notification().map(|n| n.level),
        Some(NotificationLevel::Error)
    );
}

#[tokio::test]
async fn test_shutdown_releases_active_camera() {
    let driver = FakeDriver::new(Behavior::Stream);
    let mut runtime = runtime(Arc::clone(&driver));
    start_active(&mut runtime).await;

    assert!(runtime.shutdown(WAIT).await);
    assert_eq!(driver.opened(), driver.closed());

    // No new work after shutdown
    runtime.dispatch(Message::StartScan);
    assert_eq!(state(&runtime), CameraSessionState::Idle);
}

#[tokio::test]
async fn test_export_sets_then_clears_download_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        export_dir: Some(dir.path().to_path_buf()),
        feedback_window_ms: 100,
        ..Config::default()
    };
    let mut runtime = runtime_with(
        config,
        FakeDriver::new(Behavior::Stream),
        Arc::new(FakeClipboard::default()),
    );

    runtime.dispatch(Message::PayloadChanged("hello world".into()));
    assert!(runtime.model().generate.symbol().is_some());

    runtime.dispatch(Message::ExportImage);
    assert!(
        runtime
            .run_until(|m| m.generate.download.is_active(), WAIT)
            .await
    );
    assert!(dir.path().join("qrcode.png").exists());
    assert_eq!(
        runtime.model().latest_notification().map(|n| n.message.as_str()),
        Some(messages::DOWNLOADED)
    );

    assert!(
        runtime
            .run_until(|m| !m.generate.download.is_active(), WAIT)
            .await
    );
    assert_eq!(runtime.pending_timers(), 0);
}

#[tokio::test]
async fn test_leaving_generate_cancels_feedback_timer() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        export_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let mut runtime = runtime_with(
        config,
        FakeDriver::new(Behavior::Stream),
        Arc::new(FakeClipboard::default()),
    );

    runtime.dispatch(Message::PayloadChanged("hello".into()));
    runtime.dispatch(Message::ExportImage);
    assert!(
        runtime
            .run_until(|m| m.generate.download.is_active(), WAIT)
            .await
    );
    assert_eq!(runtime.pending_timers(), 1);

    runtime.dispatch(Message::SelectMode(Mode::Scan));
    assert_eq!(runtime.pending_timers(), 0);
    assert!(!runtime.model().generate.download.is_active());
    assert!(runtime.model().generate.payload().is_empty());
}

#[tokio::test]
async fn test_copy_payload() {
    let clipboard = Arc::new(FakeClipboard::default());
    let mut runtime = runtime_with(
        Config::default(),
        FakeDriver::new(Behavior::Stream),
        Arc::clone(&clipboard),
    );

    runtime.dispatch(Message::PayloadChanged("hello".into()));
    runtime.dispatch(Message::CopyPayload);
    assert!(
        runtime
            .run_until(|m| m.generate.copied.is_active(), WAIT)
            .await
    );
    assert_eq!(*clipboard.copies.lock().unwrap(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_copy_denied_is_reported_once() {
    let clipboard = Arc::new(FakeClipboard {
        deny: true,
        ..FakeClipboard::default()
    });
    let mut runtime = runtime_with(
        Config::default(),
        FakeDriver::new(Behavior::Stream),
        Arc::clone(&clipboard),
    );

    runtime.dispatch(Message::PayloadChanged("hello".into()));
    runtime.dispatch(Message::CopyPayload);
    assert!(
        runtime
            .run_until(|m| m.latest_notification().is_some(), WAIT)
            .await
    );

    let model = runtime.model();
    assert_eq!(
        model.latest_notification().map(|n| n.level),
        Some(NotificationLevel::Error)
    );
    assert_eq!(model.notifications.len(), 1);
    assert!(!model.generate.copied.is_active());
    assert_eq!(model.generate.payload(), "hello");
}
