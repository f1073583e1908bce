//! In-memory fakes shared by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::logic::environment::{EnvironmentSnapshot, MediaDeviceInfo, MediaDeviceKind, ScreenMetrics};
use crate::logic::network::{
    HttpRequest, HttpResponse, NetworkGuardError, NetworkListener, NetworkRequest, Transport, XhrRequest,
};
use crate::logic::proctor::{PageHost, WindowMetrics};
use crate::logic::sink::{CreateSessionRequest, HeartbeatRequest, SessionSink, SinkError};
use crate::logic::violation::Violation;
use crate::logic::webcam::{
    CameraDevice, FaceDetection, FaceDetector, FaceModelLoader, MediaStream, VideoFrame, WebcamError,
    WebcamHeartbeat, WebcamListener, WebcamViolation,
};

pub const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const PAGE_URL: &str = "http://localhost:3000/mock/123";

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Plain Chrome with a camera: scores 40, safe
pub fn clean_snapshot() -> EnvironmentSnapshot {
    EnvironmentSnapshot {
        user_agent: CHROME_UA.to_string(),
        globals: vec![],
        screen: ScreenMetrics { avail_width: 1920, avail_height: 1040 },
        device_memory_gb: Some(8.0),
        fullscreen_capable: true,
        fullscreen: true,
        copy_paste_disable: true,
        devices: Some(vec![MediaDeviceInfo {
            kind: MediaDeviceKind::VideoInput,
            label: "Integrated Camera".into(),
        }]),
    }
}

/// Plain Chrome inside a VM: scores 80, blocked
pub fn vm_snapshot() -> EnvironmentSnapshot {
    EnvironmentSnapshot {
        user_agent: format!("{} VirtualBox", CHROME_UA),
        screen: ScreenMetrics { avail_width: 1024, avail_height: 768 },
        device_memory_gb: Some(1.0),
        ..clean_snapshot()
    }
}

// ============================================================================
// WEBCAM
// ============================================================================

pub struct FakeStream {
    frame: Mutex<Option<VideoFrame>>,
    releases: AtomicUsize,
}

impl FakeStream {
    pub fn with_frame(width: u32, height: u32) -> Self {
        Self {
            frame: Mutex::new(Some(VideoFrame::new(width, height))),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn set_frame(&self, frame: Option<VideoFrame>) {
        *self.frame.lock() = frame;
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.release_count() > 0
    }
}

impl MediaStream for FakeStream {
    fn current_frame(&self) -> Option<VideoFrame> {
        self.frame.lock().clone()
    }

    fn stop_tracks(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeCamera {
    stream: Result<Arc<FakeStream>, String>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeCamera {
    pub fn ok(stream: Arc<FakeStream>) -> Self {
        Self { stream: Ok(stream), calls: AtomicUsize::new(0), delay: None }
    }

    pub fn failing(message: &str) -> Self {
        Self { stream: Err(message.to_string()), calls: AtomicUsize::new(0), delay: None }
    }

    /// Permission prompt the user takes `delay` to answer
    pub fn slow(stream: Arc<FakeStream>, delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::ok(stream) }
    }

    pub fn acquire_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, WebcamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.stream {
            Ok(stream) => Ok(stream.clone()),
            Err(message) => Err(WebcamError::CameraUnavailable(message.clone())),
        }
    }
}

/// Returns queued detections in order, then the default
#[derive(Default)]
pub struct ScriptedDetector {
    script: Mutex<VecDeque<Vec<FaceDetection>>>,
    default: Mutex<Vec<FaceDetection>>,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, faces: Vec<FaceDetection>) {
        self.script.lock().push_back(faces);
    }

    pub fn set_default(&self, faces: Vec<FaceDetection>) {
        *self.default.lock() = faces;
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn estimate_faces(&self, _frame: &VideoFrame) -> Result<Vec<FaceDetection>, WebcamError> {
        let next = self.script.lock().pop_front();
        Ok(next.unwrap_or_else(|| self.default.lock().clone()))
    }
}

pub struct FakeModelLoader {
    detector: Result<Arc<ScriptedDetector>, String>,
}

impl FakeModelLoader {
    pub fn ok(detector: Arc<ScriptedDetector>) -> Self {
        Self { detector: Ok(detector) }
    }

    pub fn failing(message: &str) -> Self {
        Self { detector: Err(message.to_string()) }
    }
}

#[async_trait]
impl FaceModelLoader for FakeModelLoader {
    async fn load(&self) -> Result<Arc<dyn FaceDetector>, WebcamError> {
        match &self.detector {
            Ok(detector) => Ok(detector.clone()),
            Err(message) => Err(WebcamError::ModelFailed(message.clone())),
        }
    }
}

#[derive(Default)]
pub struct RecordingWebcamListener {
    violations: Mutex<Vec<WebcamViolation>>,
    heartbeats: Mutex<Vec<WebcamHeartbeat>>,
}

impl RecordingWebcamListener {
    pub fn violations(&self) -> Vec<WebcamViolation> {
        self.violations.lock().clone()
    }

    pub fn heartbeats(&self) -> Vec<WebcamHeartbeat> {
        self.heartbeats.lock().clone()
    }
}

#[async_trait]
impl WebcamListener for RecordingWebcamListener {
    async fn on_violation(&self, violation: WebcamViolation) {
        self.violations.lock().push(violation);
    }

    async fn on_heartbeat(&self, heartbeat: WebcamHeartbeat) {
        self.heartbeats.lock().push(heartbeat);
    }
}

// ============================================================================
// NETWORK
// ============================================================================

/// Answers every request with 200
#[derive(Default)]
pub struct FakeTransport {
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, _request: HttpRequest) -> Result<HttpResponse, NetworkGuardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse { status: 200, body: Vec::new() })
    }
}

#[derive(Default)]
pub struct FakeXhr {
    aborted: AtomicBool,
}

impl FakeXhr {
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl XhrRequest for FakeXhr {
    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingNetworkListener {
    requests: Mutex<Vec<NetworkRequest>>,
}

impl RecordingNetworkListener {
    pub fn requests(&self) -> Vec<NetworkRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl NetworkListener for RecordingNetworkListener {
    async fn on_suspicious_request(&self, request: NetworkRequest) {
        self.requests.lock().push(request);
    }
}

// ============================================================================
// SINK
// ============================================================================

pub struct RecordingSink {
    session_id: String,
    create_failures: AtomicUsize,
    create_calls: AtomicUsize,
    create_delay: Mutex<Option<Duration>>,
    fail_heartbeats: AtomicBool,
    heartbeat_calls: AtomicUsize,
    /// Accept this many more violation POSTs, then fail. `None` accepts all.
    accept_budget: Mutex<Option<usize>>,
    delivered: Mutex<Vec<Violation>>,
    heartbeats: Mutex<Vec<HeartbeatRequest>>,
    ended: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            create_failures: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            create_delay: Mutex::new(None),
            fail_heartbeats: AtomicBool::new(false),
            heartbeat_calls: AtomicUsize::new(0),
            accept_budget: Mutex::new(None),
            delivered: Mutex::new(Vec::new()),
            heartbeats: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
        }
    }

    /// The next `n` create calls fail
    pub fn fail_creates(&self, n: usize) {
        self.create_failures.store(n, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delay_creates(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    pub fn fail_heartbeats(&self, fail: bool) {
        self.fail_heartbeats.store(fail, Ordering::SeqCst);
    }

    /// Every heartbeat POST, accepted or not
    pub fn heartbeat_calls(&self) -> usize {
        self.heartbeat_calls.load(Ordering::SeqCst)
    }

    pub fn fail_violations_after(&self, n: usize) {
        *self.accept_budget.lock() = Some(n);
    }

    pub fn heal(&self) {
        *self.accept_budget.lock() = None;
    }

    pub fn delivered(&self) -> Vec<Violation> {
        self.delivered.lock().clone()
    }

    pub fn heartbeats(&self) -> Vec<HeartbeatRequest> {
        self.heartbeats.lock().clone()
    }

    pub fn ended(&self) -> Vec<String> {
        self.ended.lock().clone()
    }
}

#[async_trait]
impl SessionSink for RecordingSink {
    async fn create_session(&self, _request: &CreateSessionRequest) -> Result<String, SinkError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.create_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.create_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SinkError::Server(503));
        }
        Ok(self.session_id.clone())
    }

    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), SinkError> {
        self.heartbeat_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_heartbeats.load(Ordering::SeqCst) {
            return Err(SinkError::Server(502));
        }
        self.heartbeats.lock().push(request.clone());
        Ok(())
    }

    async fn record_violation(&self, violation: &Violation) -> Result<(), SinkError> {
        {
            let mut budget = self.accept_budget.lock();
            match budget.as_mut() {
                Some(0) => return Err(SinkError::Network("connection reset".into())),
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.delivered.lock().push(violation.clone());
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), SinkError> {
        self.ended.lock().push(session_id.to_string());
        Ok(())
    }
}

// ============================================================================
// PAGE HOST
// ============================================================================

pub struct FakePageHost {
    hidden: AtomicBool,
    fullscreen: AtomicBool,
    metrics: Mutex<WindowMetrics>,
    copy_paste_enabled: AtomicBool,
    selection_enabled: AtomicBool,
}

impl Default for FakePageHost {
    fn default() -> Self {
        Self {
            hidden: AtomicBool::new(false),
            fullscreen: AtomicBool::new(true),
            metrics: Mutex::new(WindowMetrics {
                outer_width: 1920,
                outer_height: 1080,
                inner_width: 1920,
                inner_height: 1080,
            }),
            copy_paste_enabled: AtomicBool::new(true),
            selection_enabled: AtomicBool::new(true),
        }
    }
}

impl FakePageHost {
    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::SeqCst);
    }

    pub fn set_metrics(&self, metrics: WindowMetrics) {
        *self.metrics.lock() = metrics;
    }

    pub fn copy_paste_enabled(&self) -> bool {
        self.copy_paste_enabled.load(Ordering::SeqCst)
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled.load(Ordering::SeqCst)
    }
}

impl PageHost for FakePageHost {
    fn current_url(&self) -> String {
        PAGE_URL.to_string()
    }

    fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    fn window_metrics(&self) -> WindowMetrics {
        *self.metrics.lock()
    }

    fn set_copy_paste_enabled(&self, enabled: bool) {
        self.copy_paste_enabled.store(enabled, Ordering::SeqCst);
    }

    fn set_text_selection_enabled(&self, enabled: bool) {
        self.selection_enabled.store(enabled, Ordering::SeqCst);
    }
}
