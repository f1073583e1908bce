//! Webcam Monitor - face presence analysis loop
//!
//! Owns camera acquisition, runs the analysis loop against the face detector,
//! keeps the no-face hysteresis counter and raises throttled violations.
//!
//! Loop model: a spawned task wakes once per frame callback (~16 ms) and only
//! analyses when `analyze_interval_ms` has elapsed since the last analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::logic::config::ProctorThresholds;
use crate::logic::violation::{ViolationThrottle, ViolationType};

use super::detector::{CameraDevice, FaceDetector, FaceModelLoader, MediaStream, StreamHandle};
use super::types::*;

/// Frame-callback period of the scheduling loop
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Receives everything the monitor reports
#[async_trait]
pub trait WebcamListener: Send + Sync {
    async fn on_violation(&self, violation: WebcamViolation);

    async fn on_heartbeat(&self, heartbeat: WebcamHeartbeat);
}

// ============================================================================
// MONITOR
// ============================================================================

#[derive(Debug, Default)]
struct AnalysisCounters {
    frame_count: u64,
    no_face_frames: u32,
    started_at: Option<Instant>,
}

struct MonitorInner {
    session_id: String,
    thresholds: ProctorThresholds,
    camera: Arc<dyn CameraDevice>,
    loader: Arc<dyn FaceModelLoader>,
    listener: Arc<dyn WebcamListener>,

    warm_stream: Mutex<Option<Arc<dyn MediaStream>>>,
    stream: Mutex<Option<StreamHandle>>,
    detector: RwLock<Option<Arc<dyn FaceDetector>>>,

    state: RwLock<WebcamState>,
    running: AtomicBool,
    counters: Mutex<AnalysisCounters>,
    throttle: Mutex<ViolationThrottle>,
}

pub struct WebcamMonitor {
    inner: Arc<MonitorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WebcamMonitor {
    pub fn new(
        session_id: impl Into<String>,
        thresholds: ProctorThresholds,
        camera: Arc<dyn CameraDevice>,
        loader: Arc<dyn FaceModelLoader>,
        listener: Arc<dyn WebcamListener>,
    ) -> Self {
        let cooldown = thresholds.violation_cooldown_ms;
        Self {
            inner: Arc::new(MonitorInner {
                session_id: session_id.into(),
                thresholds,
                camera,
                loader,
                listener,
                warm_stream: Mutex::new(None),
                stream: Mutex::new(None),
                detector: RwLock::new(None),
                state: RwLock::new(WebcamState::Uninitialized),
                running: AtomicBool::new(false),
                counters: Mutex::new(AnalysisCounters::default()),
                throttle: Mutex::new(ViolationThrottle::new(cooldown)),
            }),
            task: Mutex::new(None),
        }
    }

    /// Reuse a stream acquired by the caller instead of prompting again.
    /// The stream is borrowed: `stop()` never stops its tracks.
    pub fn with_warm_stream(self, stream: Arc<dyn MediaStream>) -> Self {
        *self.inner.warm_stream.lock() = Some(stream);
        self
    }

    pub fn state(&self) -> WebcamState {
        *self.inner.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Whether the current stream was acquired by this monitor
    pub fn owns_stream(&self) -> Option<bool> {
        self.inner.stream.lock().as_ref().map(StreamHandle::is_owned)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Acquire the stream and load the face model: uninitialized → initialized.
    ///
    /// On camera or model failure a violation is reported and the monitor
    /// stays uninitialized.
    pub async fn initialize(&self) -> Result<(), WebcamError> {
        let state = self.state();
        if state != WebcamState::Uninitialized {
            return Err(WebcamError::InvalidState(state));
        }

        let warm = self.inner.warm_stream.lock().take();
        let handle = match warm {
            Some(stream) => {
                log::info!("[Webcam] Camera stream initialized (reused warm stream)");
                StreamHandle::Borrowed(stream)
            }
            None => match self.acquire_camera().await {
                Ok(stream) => {
                    log::info!("[Webcam] Camera stream initialized");
                    StreamHandle::Owned(stream)
                }
                Err(e) => {
                    log::error!("[Webcam] Camera access denied or unavailable: {}", e);
                    self.inner
                        .report(ViolationType::WebcamAccessDenied, json!({
                            "error": e.to_string(),
                            "timestamp": Utc::now().to_rfc3339(),
                        }), 0, 0)
                        .await;
                    return Err(e);
                }
            },
        };

        match self.inner.loader.load().await {
            Ok(detector) => {
                log::info!("[Webcam] Face detection model loaded");
                *self.inner.detector.write() = Some(detector);
                *self.inner.stream.lock() = Some(handle);
                *self.inner.state.write() = WebcamState::Initialized;
                Ok(())
            }
            Err(e) => {
                log::error!("[Webcam] Failed to load face detection model: {}", e);
                // Hand a borrowed stream back so a retry can reuse it
                match handle {
                    StreamHandle::Borrowed(stream) => *self.inner.warm_stream.lock() = Some(stream),
                    owned => owned.release(),
                }
                self.inner
                    .report(ViolationType::FaceDetectionModelFailed, json!({ "error": e.to_string() }), 0, 0)
                    .await;
                Err(e)
            }
        }
    }

    async fn acquire_camera(&self) -> Result<Arc<dyn MediaStream>, WebcamError> {
        let timeout = self.inner.thresholds.webcam_timeout();
        match tokio::time::timeout(timeout, self.inner.camera.acquire()).await {
            Ok(result) => result,
            Err(_) => Err(WebcamError::CameraTimeout(self.inner.thresholds.webcam_timeout_ms)),
        }
    }

    /// initialized → running; spawns the analysis loop
    pub fn start(&self) -> Result<(), WebcamError> {
        let state = self.state();
        if state != WebcamState::Initialized {
            return Err(WebcamError::InvalidState(state));
        }

        {
            let mut counters = self.inner.counters.lock();
            counters.frame_count = 0;
            counters.no_face_frames = 0;
            counters.started_at = Some(Instant::now());
        }
        self.inner.throttle.lock().reset();
        self.inner.running.store(true, Ordering::SeqCst);
        *self.inner.state.write() = WebcamState::Running;

        let inner = Arc::clone(&self.inner);
        *self.task.lock() = Some(tokio::spawn(run_loop(inner)));

        log::info!(
            "[Webcam] Monitoring started (analyze every {} ms)",
            self.inner.thresholds.analyze_interval_ms
        );
        Ok(())
    }

    /// Stop the loop and release the camera. Safe to call repeatedly.
    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }

        {
            let mut state = self.inner.state.write();
            match *state {
                WebcamState::Initialized | WebcamState::Running => *state = WebcamState::Stopped,
                _ => return,
            }
        }

        if let Some(handle) = self.inner.stream.lock().take() {
            handle.release();
        }
        *self.inner.detector.write() = None;

        log::info!("[Webcam] Monitoring stopped");
    }

    pub fn stats(&self) -> WebcamStats {
        let counters = self.inner.counters.lock();
        let uptime_ms = counters
            .started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        WebcamStats {
            frame_count: counters.frame_count,
            fps: fps(counters.frame_count, uptime_ms),
            uptime_ms,
            is_active: self.is_active(),
        }
    }

    /// Analyse the current frame as if `now_ms` had elapsed since start.
    /// Returns `None` when the tick was skipped.
    pub async fn analyze_at(&self, now_ms: u64) -> Option<FaceDetectionResult> {
        self.inner.analyze_at(now_ms).await
    }
}

impl Drop for WebcamMonitor {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

// ============================================================================
// ANALYSIS
// ============================================================================

async fn run_loop(inner: Arc<MonitorInner>) {
    let started = Instant::now();
    let interval_ms = inner.thresholds.analyze_interval_ms;
    let mut last_analysis: Option<u64> = None;

    loop {
        if !inner.running.load(Ordering::SeqCst) {
            break;
        }

        let now_ms = started.elapsed().as_millis() as u64;
        let due = last_analysis.map_or(true, |last| now_ms.saturating_sub(last) >= interval_ms);
        if due {
            last_analysis = Some(now_ms);
            inner.analyze_at(now_ms).await;
        }

        tokio::time::sleep(FRAME_PERIOD).await;
    }

    log::debug!("[Webcam] Analysis loop exited");
}

/// Running average: frames / elapsed seconds
fn fps(frame_count: u64, elapsed_ms: u64) -> f32 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    frame_count as f32 / (elapsed_ms as f32 / 1000.0)
}

impl MonitorInner {
    async fn analyze_at(&self, now_ms: u64) -> Option<FaceDetectionResult> {
        let stream = self.stream.lock().as_ref().map(|h| Arc::clone(h.stream()))?;
        let detector = self.detector.read().clone()?;

        let frame = match stream.current_frame() {
            Some(frame) if !frame.is_empty() => frame,
            _ => return None,
        };

        let frame_number = {
            let mut counters = self.counters.lock();
            counters.frame_count += 1;
            counters.frame_count
        };

        let detections = match detector.estimate_faces(&frame).await {
            Ok(d) => d,
            Err(e) => {
                log::error!("[Webcam] Error analyzing faces: {}", e);
                return None;
            }
        };

        let result = FaceDetectionResult::from_detections(&detections, fps(frame_number, now_ms));

        let no_face_frames = {
            let mut counters = self.counters.lock();
            if result.face_detected {
                counters.no_face_frames = 0;
            } else {
                counters.no_face_frames += 1;
            }
            counters.no_face_frames
        };

        for (kind, details) in self.classify(&result, no_face_frames) {
            self.trigger(kind, details, frame_number, now_ms).await;
        }

        let every = self.thresholds.heartbeat_every_frames.max(1);
        if frame_number % every == 0 {
            self.listener
                .on_heartbeat(WebcamHeartbeat {
                    session_id: self.session_id.clone(),
                    webcam_data: WebcamData::from(&result),
                    timestamp: Utc::now(),
                })
                .await;
        }

        Some(result)
    }

    /// Violations this tick would raise, before throttling
    fn classify(&self, result: &FaceDetectionResult, no_face_frames: u32) -> Vec<(ViolationType, serde_json::Value)> {
        let mut found = Vec::new();

        if result.multiple_faces {
            found.push((
                ViolationType::MultipleFaces,
                json!({ "faceCount": result.face_count, "confidence": result.confidence }),
            ));
        }

        if !result.face_detected && no_face_frames > self.thresholds.face_continuity_frames {
            found.push((
                ViolationType::FaceNotDetected,
                json!({ "consecutiveFramesWithoutFace": no_face_frames }),
            ));
        }

        if result.face_detected && result.confidence < self.thresholds.face_confidence_threshold {
            found.push((
                ViolationType::LowFaceConfidence,
                json!({ "confidence": result.confidence }),
            ));
        }

        found
    }

    async fn trigger(&self, kind: ViolationType, details: serde_json::Value, frame_number: u64, now_ms: u64) {
        if !self.throttle.lock().try_fire(kind, now_ms) {
            log::debug!("[Webcam] {} throttled at {} ms", kind, now_ms);
            return;
        }

        log::warn!("[Webcam] Violation detected: {} (frame {})", kind, frame_number);
        self.report(kind, details, frame_number, now_ms).await;
    }

    async fn report(&self, kind: ViolationType, mut details: serde_json::Value, frame_number: u64, timestamp_ms: u64) {
        if let Some(obj) = details.as_object_mut() {
            obj.insert("frameNumber".into(), json!(frame_number));
        }

        self.listener
            .on_violation(WebcamViolation {
                kind,
                frame_number,
                timestamp_ms,
                details,
            })
            .await;
    }
}
