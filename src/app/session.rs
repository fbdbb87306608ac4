// SPDX-License-Identifier: GPL-3.0-only

//! Camera session state machine
//!
//! ```text
//!            start                acquired(Ok)
//!   Idle ───────────▶ Starting ───────────────▶ Active
//!    ▲                  │  │                      │ │
//!    │     acquired(Err)│  │stop          decoded/│ │fault
//!    │                  ▼  ▼              stop    ▼ ▼
//!    │               Error  Stopping ◀────────── Error
//!    │                  │       │    (release in flight)
//!    └──────────────────┴───────┘
//!          stop / released
//! ```
//!
//! The session never touches the device itself: it emits `AcquireCamera` and
//! `ReleaseCamera` effects and is fed their completions. Every completion is
//! tagged with the [`SessionId`] it belongs to, and a stream delivered to a
//! session that no longer wants it is released immediately, so no path can
//! leave a device open.

use super::frame_processor::ScanResult;
use super::state::{Effect, SessionId, StreamHandle, Task};
use crate::backends::camera::{BackendError, DecodeEvent, ScanRequest};
use crate::errors::CameraError;
use tracing::{debug, info, warn};

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSessionState {
    Idle,
    Starting,
    Active,
    Stopping,
    Error,
}

impl std::fmt::Display for CameraSessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CameraSessionState::Idle => "idle",
            CameraSessionState::Starting => "starting",
            CameraSessionState::Active => "active",
            CameraSessionState::Stopping => "stopping",
            CameraSessionState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// What a stopping session is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    /// Stop arrived while the device was still being acquired
    Acquisition,
    /// The stream has been handed back for release
    Release,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Starting {
        id: SessionId,
    },
    Active {
        id: SessionId,
        stream: StreamHandle,
    },
    Stopping {
        id: SessionId,
        awaiting: Awaiting,
        /// Start requested while stopping; runs once teardown completes
        restart: Option<ScanRequest>,
    },
    Error {
        message: String,
        /// Release still in flight after a fault
        releasing: Option<SessionId>,
    },
}

/// One camera, one decode loop, at most one result
#[derive(Debug)]
pub struct CameraSession {
    phase: Phase,
    result: Option<ScanResult>,
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
        }
    }

    pub fn state(&self) -> CameraSessionState {
        match self.phase {
            Phase::Idle => CameraSessionState::Idle,
            Phase::Starting { .. } => CameraSessionState::Starting,
            Phase::Active { .. } => CameraSessionState::Active,
            Phase::Stopping { .. } => CameraSessionState::Stopping,
            Phase::Error { .. } => CameraSessionState::Error,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Whether a device handle is (or may be about to be) held
    pub fn is_busy(&self) -> bool {
        match &self.phase {
            Phase::Idle => false,
            Phase::Error { releasing, .. } => releasing.is_some(),
            _ => true,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Path of the streaming device, while Active
    pub fn device_path(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active { stream, .. } => Some(stream.device_path()),
            _ => None,
        }
    }

    /// Request a device and start decoding
    ///
    /// Rejected while a session is starting or streaming, or while an
    /// uncleared result exists. While a previous session is still being
    /// torn down the start is queued behind that teardown.
    pub fn start(&mut self, request: ScanRequest) -> Result<Task, CameraError> {
        if self.result.is_some() {
            return Err(CameraError::ResultPending);
        }

        match &mut self.phase {
            Phase::Starting { .. } | Phase::Active { .. } => Err(CameraError::AlreadyActive),
            Phase::Stopping { id, restart, .. } => {
                debug!(session = %id, "Start queued behind teardown");
                *restart = Some(request);
                Ok(Task::none())
            }
            Phase::Error {
                releasing: Some(id),
                ..
            } => {
                let id = *id;
                debug!(session = %id, "Start queued behind fault teardown");
                self.phase = Phase::Stopping {
                    id,
                    awaiting: Awaiting::Release,
                    restart: Some(request),
                };
                Ok(Task::none())
            }
            Phase::Idle | Phase::Error { releasing: None, .. } => Ok(self.begin(request)),
        }
    }

    fn begin(&mut self, request: ScanRequest) -> Task {
        let id = SessionId::new();
        info!(session = %id, fps = request.fps, "Starting camera session");
        self.phase = Phase::Starting { id };
        Task::effect(Effect::AcquireCamera { id, request })
    }

    /// Device acquisition resolved
    pub fn acquired(&mut self, id: SessionId, result: Result<StreamHandle, BackendError>) -> Task {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match (phase, result) {
            (Phase::Starting { id: current }, Ok(stream)) if current == id => {
                info!(session = %id, device = %stream.device_path(), "Camera session active");
                self.phase = Phase::Active { id, stream };
                Task::none()
            }
            (Phase::Starting { id: current }, Err(e)) if current == id => {
                warn!(session = %id, error = %e, "Camera acquisition failed");
                self.phase = Phase::Error {
                    message: e.to_string(),
                    releasing: None,
                };
                Task::none()
            }
            (
                Phase::Stopping {
                    id: current,
                    awaiting: Awaiting::Acquisition,
                    restart,
                },
                result,
            ) if current == id => match result {
                // Deferred cancellation: the stop that arrived during
                // acquisition is applied now
                Ok(stream) => {
                    debug!(session = %id, "Releasing camera acquired after stop");
                    self.phase = Phase::Stopping {
                        id,
                        awaiting: Awaiting::Release,
                        restart,
                    };
                    Task::effect(Effect::ReleaseCamera { id, stream })
                }
                Err(e) => {
                    debug!(session = %id, error = %e, "Cancelled acquisition failed");
                    self.finish_stop(restart)
                }
            },
            (phase, result) => {
                self.phase = phase;
                match result {
                    Ok(stream) => {
                        warn!(session = %id, "Releasing stale camera stream");
                        Task::effect(Effect::ReleaseCamera { id, stream })
                    }
                    Err(e) => {
                        debug!(session = %id, error = %e, "Ignoring stale acquisition failure");
                        Task::none()
                    }
                }
            }
        }
    }

    /// Decoder reported on a frame
    pub fn decode(&mut self, id: SessionId, event: DecodeEvent) -> Task {
        let current = match &self.phase {
            Phase::Active { id: current, .. } if *current == id => *current,
            _ => {
                debug!(session = %id, "Ignoring decode event outside active session");
                return Task::none();
            }
        };

        match event {
            DecodeEvent::NoSymbol => Task::none(),
            DecodeEvent::Decoded(text) => {
                info!(session = %current, bytes = text.len(), "Symbol decoded");
                self.result = Some(ScanResult::new(text));
                self.stop()
            }
            DecodeEvent::Fault(message) => {
                warn!(session = %current, %message, "Decoder fault");
                let phase = std::mem::replace(&mut self.phase, Phase::Idle);
                match phase {
                    Phase::Active { id, stream } => {
                        self.phase = Phase::Error {
                            message,
                            releasing: Some(id),
                        };
                        Task::effect(Effect::ReleaseCamera { id, stream })
                    }
                    other => {
                        self.phase = other;
                        Task::none()
                    }
                }
            }
        }
    }

    /// Stop streaming and release the device
    ///
    /// Idempotent: never emits a second release. A start queued behind an
    /// ongoing teardown is dropped, so the session always ends Idle.
    pub fn stop(&mut self) -> Task {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Idle => Task::none(),
            Phase::Starting { id } => {
                debug!(session = %id, "Stop requested during acquisition");
                self.phase = Phase::Stopping {
                    id,
                    awaiting: Awaiting::Acquisition,
                    restart: None,
                };
                Task::none()
            }
            Phase::Active { id, stream } => {
                info!(session = %id, "Stopping camera session");
                self.phase = Phase::Stopping {
                    id,
                    awaiting: Awaiting::Release,
                    restart: None,
                };
                Task::effect(Effect::ReleaseCamera { id, stream })
            }
            Phase::Stopping { id, awaiting, restart } => {
                if restart.is_some() {
                    debug!(session = %id, "Queued start dropped by stop");
                }
                self.phase = Phase::Stopping {
                    id,
                    awaiting,
                    restart: None,
                };
                Task::none()
            }
            Phase::Error {
                releasing: Some(id),
                ..
            } => {
                self.phase = Phase::Stopping {
                    id,
                    awaiting: Awaiting::Release,
                    restart: None,
                };
                Task::none()
            }
            Phase::Error {
                releasing: None, ..
            } => Task::none(),
        }
    }

    /// Device release resolved
    ///
    /// Release failures are logged; the session settles regardless.
    pub fn released(&mut self, id: SessionId, result: Result<(), BackendError>) -> Task {
        if let Err(e) = &result {
            warn!(session = %id, error = %e, "Camera release reported an error");
        }

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Stopping {
                id: current,
                awaiting: Awaiting::Release,
                restart,
            } if current == id => {
                info!(session = %id, "Camera released");
                self.finish_stop(restart)
            }
            Phase::Error {
                message,
                releasing: Some(current),
            } if current == id => {
                info!(session = %id, "Camera released after fault");
                self.phase = Phase::Error {
                    message,
                    releasing: None,
                };
                Task::none()
            }
            other => {
                self.phase = other;
                Task::none()
            }
        }
    }

    fn finish_stop(&mut self, restart: Option<ScanRequest>) -> Task {
        self.phase = Phase::Idle;
        match restart {
            Some(request) if self.result.is_none() => self.begin(request),
            _ => Task::none(),
        }
    }

    /// Clear the result so a new scan may start
    ///
    /// Returns whether a result was cleared.
    pub fn reset_result(&mut self) -> bool {
        if matches!(self.phase, Phase::Active { .. }) {
            return false;
        }
        self.result.take().is_some()
    }

    /// Tear down for good: stop, drop the result and any queued start
    pub fn discard(&mut self) -> Task {
        self.result = None;
        self.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{
        BackendResult, CameraDevice, CameraLocation, CameraStream, FacingMode,
    };

    struct NullStream(CameraDevice);

    impl CameraStream for NullStream {
        fn device(&self) -> &CameraDevice {
            &self.0
        }
        fn is_running(&self) -> bool {
            true
        }
        fn close(self: Box<Self>) -> BackendResult<()> {
            Ok(())
        }
    }

    fn stream() -> StreamHandle {
        StreamHandle::new(Box::new(NullStream(CameraDevice {
            name: "null".into(),
            path: "/dev/null0".into(),
            location: CameraLocation::Back,
        })))
    }

    fn request() -> ScanRequest {
        ScanRequest {
            facing: FacingMode::Environment,
            fps: 10,
            window: None,
            device_path: None,
        }
    }

    fn acquire_id(task: &Task) -> SessionId {
        match task.effects() {
            [Effect::AcquireCamera { id, .. }] => *id,
            other => panic!("expected acquisition, got {:?}", other),
        }
    }

    fn release_id(task: Task) -> (SessionId, StreamHandle) {
        match task.into_effects().pop() {
            Some(Effect::ReleaseCamera { id, stream }) => (id, stream),
            other => panic!("expected release, got {:?}", other),
        }
    }

    fn active_session() -> (CameraSession, SessionId) {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        assert!(session.acquired(id, Ok(stream())).is_none());
        assert_eq!(session.state(), CameraSessionState::Active);
        (session, id)
    }

    #[test]
    fn test_start_acquire_active() {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        assert_eq!(session.state(), CameraSessionState::Starting);
        let _ = session.acquired(id, Ok(stream()));
        assert_eq!(session.state(), CameraSessionState::Active);
        assert_eq!(session.device_path(), Some("/dev/null0"));
    }

    #[test]
    fn test_second_start_rejected() {
        let mut session = CameraSession::new();
        let _ = session.start(request()).unwrap();
        assert_eq!(
            session.start(request()).err(),
            Some(CameraError::AlreadyActive)
        );

        let (mut active, _) = active_session();
        assert_eq!(active.start(request()).err(), Some(CameraError::AlreadyActive));
    }

    #[test]
    fn test_permission_denied_goes_to_error() {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        let task = session.acquired(
            id,
            Err(BackendError::PermissionDenied("/dev/video0".into())),
        );
        assert!(task.is_none());
        assert_eq!(session.state(), CameraSessionState::Error);
        assert!(!session.is_busy());
        assert!(session.error_message().is_some());

        // stop settles the error
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Idle);
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_start_from_error_retries() {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        let _ = session.acquired(id, Err(BackendError::Busy("in use".into())));
        let retry = acquire_id(&session.start(request()).unwrap());
        assert_ne!(retry, id);
        assert_eq!(session.state(), CameraSessionState::Starting);
    }

    #[test]
    fn test_decode_captures_result_and_stops() {
        let (mut session, id) = active_session();
        assert!(session.decode(id, DecodeEvent::NoSymbol).is_none());
        assert_eq!(session.state(), CameraSessionState::Active);

        let task = session.decode(id, DecodeEvent::Decoded("https://a.b".into()));
        assert_eq!(session.state(), CameraSessionState::Stopping);
        assert_eq!(session.result().map(|r| r.text.as_str()), Some("https://a.b"));

        let (release_id, _stream) = release_id(task);
        assert_eq!(release_id, id);
        let _ = session.released(id, Ok(()));
        assert_eq!(session.state(), CameraSessionState::Idle);
        assert!(session.result().is_some_and(|r| r.is_link()));
    }

    #[test]
    fn test_result_blocks_start_until_reset() {
        let (mut session, id) = active_session();
        let _ = session.decode(id, DecodeEvent::Decoded("x".into()));
        let _ = session.released(id, Ok(()));

        assert_eq!(session.start(request()).err(), Some(CameraError::ResultPending));
        assert!(session.reset_result());
        assert!(!session.reset_result());
        assert!(session.start(request()).is_ok());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = CameraSession::new();
        assert!(session.stop().is_none());
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Idle);

        let (mut session, id) = active_session();
        let first = session.stop();
        assert!(!first.is_none());
        assert!(session.stop().is_none());
        let _ = session.released(id, Ok(()));
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_stop_during_acquisition_releases_on_arrival() {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Stopping);

        let (release, _stream) = release_id(session.acquired(id, Ok(stream())));
        assert_eq!(release, id);
        let _ = session.released(id, Ok(()));
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_stop_during_failed_acquisition_settles_idle() {
        let mut session = CameraSession::new();
        let id = acquire_id(&session.start(request()).unwrap());
        let _ = session.stop();
        let _ = session.acquired(id, Err(BackendError::PermissionDenied("x".into())));
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_stale_stream_is_released() {
        let mut session = CameraSession::new();
        let stale = SessionId::new();
        let (release, _stream) = release_id(session.acquired(stale, Ok(stream())));
        assert_eq!(release, stale);
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_stale_decode_ignored() {
        let (mut session, _) = active_session();
        assert!(
            session
                .decode(SessionId::new(), DecodeEvent::Decoded("late".into()))
                .is_none()
        );
        assert!(session.result().is_none());
    }

    #[test]
    fn test_fault_releases_and_errors() {
        let (mut session, id) = active_session();
        let (release, _stream) = release_id(session.decode(id, DecodeEvent::Fault("gone".into())));
        assert_eq!(release, id);
        assert_eq!(session.state(), CameraSessionState::Error);
        assert!(session.is_busy());

        let _ = session.released(id, Ok(()));
        assert_eq!(session.state(), CameraSessionState::Error);
        assert!(!session.is_busy());
        assert_eq!(session.error_message(), Some("gone"));
    }

    #[test]
    fn test_release_error_still_settles() {
        let (mut session, id) = active_session();
        let _ = session.stop();
        let _ = session.released(id, Err(BackendError::IoError("EIO".into())));
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_start_queued_behind_teardown() {
        let (mut session, id) = active_session();
        let _ = session.stop();
        assert!(session.start(request()).unwrap().is_none());

        let task = session.released(id, Ok(()));
        let next = acquire_id(&task);
        assert_ne!(next, id);
        assert_eq!(session.state(), CameraSessionState::Starting);
    }

    #[test]
    fn test_stop_drops_queued_start() {
        let (mut session, id) = active_session();
        let _ = session.stop();
        assert!(session.start(request()).unwrap().is_none());
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Stopping);

        let task = session.released(id, Ok(()));
        assert!(
            !task
                .effects()
                .iter()
                .any(|e| matches!(e, Effect::AcquireCamera { .. }))
        );
        assert_eq!(session.state(), CameraSessionState::Idle);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_stop_during_fault_release_settles_idle() {
        let (mut session, id) = active_session();
        let _ = session.decode(id, DecodeEvent::Fault("gone".into()));
        assert!(session.is_busy());

        // Release already in flight; stop must not emit a second one
        assert!(session.stop().is_none());
        assert_eq!(session.state(), CameraSessionState::Stopping);
        assert!(session.stop().is_none());

        assert!(session.released(id, Ok(())).is_none());
        assert_eq!(session.state(), CameraSessionState::Idle);
        assert!(!session.is_busy());
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_start_during_fault_release_runs_after_release() {
        let (mut session, id) = active_session();
        let _ = session.decode(id, DecodeEvent::Fault("gone".into()));
        assert!(session.start(request()).unwrap().is_none());
        assert_eq!(session.state(), CameraSessionState::Stopping);

        let next = acquire_id(&session.released(id, Ok(())));
        assert_ne!(next, id);
        assert_eq!(session.state(), CameraSessionState::Starting);
    }

    #[test]
    fn test_discard_drops_queued_start_and_result() {
        let (mut session, id) = active_session();
        let _ = session.decode(id, DecodeEvent::Decoded("x".into()));
        let _ = session.discard();
        assert!(session.result().is_none());
        assert!(session.released(id, Ok(())).is_none());
        assert_eq!(session.state(), CameraSessionState::Idle);
    }
}
