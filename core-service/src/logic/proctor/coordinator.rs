//! Proctor Coordinator - session lifecycle
//!
//! Inactive → Active exactly once (successful `start`), then → Ended exactly
//! once (`stop` or a blocked admission). Nothing is recorded once Ended.
//!
//! start():
//! 1. create the remote session (with preflight retries)
//! 2. environment admission gate
//! 3. webcam (best-effort)
//! 4. network guard + hardening
//! 5. copy/paste and selection lockdown
//! 6. flush loop
//! 7. Active

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::logic::environment::{BrowserInfo, EnvironmentAssessor, EnvironmentProbe, Recommendation, RiskAssessment};
use crate::logic::network::{
    GuardConfig, NetworkEntryPoint, NetworkGuard, NetworkListener, NetworkRequest, NAVIGATION_METHOD,
};
use crate::logic::sink::{CreateSessionRequest, HeartbeatRequest, SessionSink, SinkError};
use crate::logic::telemetry::{TelemetryEventType, TelemetryLog};
use crate::logic::violation::{Severity, Violation, ViolationQueue, ViolationType};
use crate::logic::webcam::{
    CameraDevice, FaceModelLoader, MediaStream, WebcamHeartbeat, WebcamListener, WebcamMonitor, WebcamViolation,
};

use super::checks::check_session;
use super::host::PageHost;
use super::risk::{session_risk, ViolationTally};
use super::types::*;

/// External collaborators of a proctored session
#[derive(Clone)]
pub struct ProctorDeps {
    pub sink: Arc<dyn SessionSink>,
    pub probe: Arc<dyn EnvironmentProbe>,
    pub host: Arc<dyn PageHost>,
    pub camera: Arc<dyn CameraDevice>,
    pub face_model: Arc<dyn FaceModelLoader>,
    pub network: Arc<NetworkEntryPoint>,
    /// Stream acquired earlier in the flow, reused without a second prompt
    pub warm_stream: Option<Arc<dyn MediaStream>>,
}

// ============================================================================
// COORDINATOR
// ============================================================================

pub struct ProctorCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: ProctorConfig,
    deps: ProctorDeps,

    state: RwLock<SessionState>,
    session_id: RwLock<Option<String>>,
    browser_info: RwLock<Option<BrowserInfo>>,
    assessment: RwLock<Option<RiskAssessment>>,

    queue: Mutex<ViolationQueue>,
    /// Serialises flushes so batches leave in FIFO order
    flush_lock: tokio::sync::Mutex<()>,
    tally: Mutex<ViolationTally>,
    network_blocked: Mutex<u32>,

    webcam: RwLock<Option<Arc<WebcamMonitor>>>,
    webcam_failed: AtomicBool,
    /// Held for the whole of `start()`; a second concurrent start fails fast
    starting: AtomicBool,
    guard: RwLock<Option<Arc<NetworkGuard>>>,
    flush_task: Mutex<Option<JoinHandle<()>>>,

    telemetry: TelemetryLog,
}

impl ProctorCoordinator {
    pub fn new(config: ProctorConfig, deps: ProctorDeps) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                deps,
                state: RwLock::new(SessionState::Inactive),
                session_id: RwLock::new(None),
                browser_info: RwLock::new(None),
                assessment: RwLock::new(None),
                queue: Mutex::new(ViolationQueue::new()),
                flush_lock: tokio::sync::Mutex::new(()),
                tally: Mutex::new(ViolationTally::default()),
                network_blocked: Mutex::new(0),
                webcam: RwLock::new(None),
                webcam_failed: AtomicBool::new(false),
                starting: AtomicBool::new(false),
                guard: RwLock::new(None),
                flush_task: Mutex::new(None),
                telemetry: TelemetryLog::new(),
            }),
        }
    }

    /// Start proctoring. False if the session could not be created, the
    /// environment was blocked, or the coordinator was already started.
    pub async fn start(&self) -> bool {
        log::info!("[Proctor] Starting proctoring system...");

        if self.inner.starting.swap(true, Ordering::SeqCst) {
            log::warn!("[Proctor] Start already in progress");
            return false;
        }
        let result = CoordinatorInner::try_start(&self.inner).await;
        self.inner.starting.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                log::info!("[Proctor] Proctoring system started successfully");
                true
            }
            Err(e) => {
                log::error!("[Proctor] Failed to start: {}", e);
                false
            }
        }
    }

    /// Stop monitoring, drain the queue and close the session. Idempotent.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Queue a violation for this session. Critical ones are flushed at once.
    /// Returns false once the session has ended.
    pub async fn record_violation(
        &self,
        kind: ViolationType,
        severity: Severity,
        description: impl Into<String>,
    ) -> bool {
        self.inner
            .record(kind, severity, description.into(), serde_json::Value::Null)
            .await
    }

    /// Send up to one batch. Returns how many were delivered.
    pub async fn flush_violations(&self) -> usize {
        self.inner.flush().await
    }

    /// One periodic tick: flush, then session-level checks
    pub async fn tick(&self) {
        self.inner.tick().await;
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.session_id.read().clone()
    }

    pub fn assessment(&self) -> Option<RiskAssessment> {
        self.inner.assessment.read().clone()
    }

    pub fn queued_violations(&self) -> Vec<Violation> {
        self.inner.queue.lock().snapshot()
    }

    pub fn network_guard(&self) -> Option<Arc<NetworkGuard>> {
        self.inner.guard.read().clone()
    }

    pub fn webcam(&self) -> Option<Arc<WebcamMonitor>> {
        self.inner.webcam.read().clone()
    }

    pub fn telemetry(&self) -> &TelemetryLog {
        &self.inner.telemetry
    }

    pub fn status(&self) -> ProctorStatus {
        ProctorStatus {
            is_active: self.is_active(),
            webcam: self.inner.webcam.read().as_ref().map_or(false, |w| w.is_active()),
            network_monitoring: self.inner.guard.read().as_ref().map_or(false, |g| g.is_running()),
            violations: self.inner.queue.lock().len(),
        }
    }

    pub fn metrics(&self) -> ProctorMetrics {
        let inner = &self.inner;
        let tally = inner.tally.lock().clone();
        let secured = inner
            .browser_info
            .read()
            .as_ref()
            .map_or(false, BrowserInfo::is_secured);

        let webcam_status = if inner.webcam_failed.load(Ordering::SeqCst) {
            WebcamStatus::Error
        } else if inner.webcam.read().as_ref().map_or(false, |w| w.is_active()) {
            WebcamStatus::Active
        } else {
            WebcamStatus::Inactive
        };

        ProctorMetrics {
            session_id: self.session_id(),
            state: self.state(),
            total_violations: tally.total,
            violations_by_type: tally.by_type.clone(),
            webcam_status,
            network_blocked: *inner.network_blocked.lock(),
            admission_risk_score: inner.assessment.read().as_ref().map(|a| a.overall),
            session_risk: session_risk(&tally, secured, &inner.config.thresholds),
            last_update: Utc::now(),
        }
    }
}

impl Drop for ProctorCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.inner.flush_task.lock().take() {
            task.abort();
        }
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

impl CoordinatorInner {
    fn state(&self) -> SessionState {
        *self.state.read()
    }

    async fn try_start(this: &Arc<Self>) -> Result<(), ProctorError> {
        let state = this.state();
        if state != SessionState::Inactive || this.session_id.read().is_some() {
            return Err(ProctorError::InvalidState(state));
        }
        let thresholds = &this.config.thresholds;

        // 1. Remote session
        let assessor = EnvironmentAssessor::new(Arc::clone(&this.deps.probe), thresholds.network_timeout());
        let browser_info = assessor.identify_browser().await;
        let request = CreateSessionRequest {
            mock_test_id: this.config.mock_test_id.clone(),
            exam_type: this.config.exam_type,
            browser_info: browser_info.clone(),
            ip_address: this.deps.sink.public_ip().await,
        };

        let session_id = match this.create_session_with_retries(&request).await {
            Ok(id) => id,
            Err(e) => {
                this.telemetry
                    .record(TelemetryEventType::SessionCreateFailed, json!({ "error": e.to_string() }));
                return Err(ProctorError::SessionCreate(e));
            }
        };
        log::info!("[Proctor] Exam session created: {}", session_id);
        this.telemetry
            .record(TelemetryEventType::SessionCreated, json!({ "sessionId": session_id }));

        // stop() ran while the session was being created and could not close it
        if let Err(e) = this.ensure_starting() {
            log::warn!("[Proctor] Stopped during start, closing session {}", session_id);
            if let Err(end_err) = this.deps.sink.end_session(&session_id).await {
                log::error!("[Proctor] Error ending session {}: {}", session_id, end_err);
            }
            return Err(e);
        }
        *this.session_id.write() = Some(session_id.clone());
        *this.browser_info.write() = Some(browser_info.clone());

        // 2. Admission gate
        let assessment = assessor.assess_with(&browser_info);
        *this.assessment.write() = Some(assessment.clone());
        this.telemetry.record(
            TelemetryEventType::AdmissionAssessed,
            json!({ "overall": assessment.overall, "recommendation": assessment.recommendation.as_str() }),
        );

        match assessment.recommendation {
            Recommendation::Safe => {}
            Recommendation::Caution => {
                log::warn!("[Proctor] Medium security risk detected: {:?}", assessment.issues);
            }
            Recommendation::Blocked => {
                log::error!("[Proctor] High security risk ({}), exam blocked", assessment.overall);
                this.record(
                    ViolationType::SecurityThreat,
                    Severity::Critical,
                    assessment.issues.join("; "),
                    json!({ "riskScore": assessment.overall }),
                )
                .await;
                this.telemetry
                    .record(TelemetryEventType::AdmissionBlocked, json!({ "overall": assessment.overall }));
                this.end_blocked(&session_id).await;
                return Err(ProctorError::AdmissionBlocked(assessment.overall));
            }
        }

        // 3. Webcam, best-effort
        if this.config.enable_webcam {
            Self::start_webcam(this, &session_id).await;
            if let Err(e) = this.ensure_starting() {
                this.abandon_start();
                return Err(e);
            }
        }

        // No awaits from here until Active

        // 4. Network guard + hardening
        let guard_error = if this.config.enable_network_monitoring {
            Self::start_network_guard(this).err()
        } else {
            None
        };

        // 5. Page lockdown
        if this.config.enable_clipboard_disable {
            this.deps.host.set_copy_paste_enabled(false);
            this.deps.host.set_text_selection_enabled(false);
        }

        // 6. Flush loop
        *this.flush_task.lock() = Some(spawn_flush_loop(this));

        // 7. Active
        {
            let mut state = this.state.write();
            if *state != SessionState::Inactive {
                let current = *state;
                drop(state);
                this.abandon_start();
                return Err(ProctorError::InvalidState(current));
            }
            *state = SessionState::Active;
        }
        this.telemetry
            .record(TelemetryEventType::ProctoringStarted, json!({ "sessionId": session_id }));

        if let Some(e) = guard_error {
            log::error!("[Proctor] Network monitoring initialization error: {}", e);
            this.record(ViolationType::StartupError, Severity::High, e.to_string(), serde_json::Value::Null)
                .await;
        }
        Ok(())
    }

    /// Fails once `stop()` has ended the session under a pending start
    fn ensure_starting(&self) -> Result<(), ProctorError> {
        match self.state() {
            SessionState::Inactive => Ok(()),
            state => Err(ProctorError::InvalidState(state)),
        }
    }

    /// Undo what a start cut short by `stop()` brought up
    fn abandon_start(&self) {
        log::warn!("[Proctor] Stopped during start, tearing down");
        if let Some(webcam) = self.webcam.read().clone() {
            webcam.stop();
        }
        if let Some(guard) = self.guard.read().clone() {
            guard.stop();
        }
        if let Some(task) = self.flush_task.lock().take() {
            task.abort();
        }
        if self.config.enable_clipboard_disable {
            self.deps.host.set_copy_paste_enabled(true);
            self.deps.host.set_text_selection_enabled(true);
        }
    }

    async fn create_session_with_retries(&self, request: &CreateSessionRequest) -> Result<String, SinkError> {
        let thresholds = &self.config.thresholds;
        let attempts = thresholds.max_preflight_retries + 1;
        let mut last_error = SinkError::MissingSessionId;

        for attempt in 1..=attempts {
            match self.deps.sink.create_session(request).await {
                Ok(id) => return Ok(id),
                Err(e) => {
                    log::warn!("[Proctor] Session create attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(thresholds.preflight_retry_delay()).await;
            }
        }

        Err(last_error)
    }

    /// Blocked admission: the session ends without ever going active
    async fn end_blocked(&self, session_id: &str) {
        {
            let mut state = self.state.write();
            if *state == SessionState::Ended {
                // stop() already closed it
                return;
            }
            *state = SessionState::Ended;
        }
        if let Err(e) = self.deps.sink.end_session(session_id).await {
            log::error!("[Proctor] Failed to end blocked session {}: {}", session_id, e);
        }
    }

    async fn start_webcam(this: &Arc<Self>, session_id: &str) {
        let listener = Arc::new(WebcamBridge(Arc::downgrade(this)));
        let mut monitor = WebcamMonitor::new(
            session_id,
            this.config.thresholds.clone(),
            Arc::clone(&this.deps.camera),
            Arc::clone(&this.deps.face_model),
            listener,
        );
        if let Some(warm) = &this.deps.warm_stream {
            monitor = monitor.with_warm_stream(Arc::clone(warm));
        }

        let started = match monitor.initialize().await {
            Ok(()) => monitor.start(),
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => *this.webcam.write() = Some(Arc::new(monitor)),
            Err(e) => {
                log::warn!("[Proctor] Webcam initialization failed, continuing without video: {}", e);
                this.webcam_failed.store(true, Ordering::SeqCst);
                this.telemetry
                    .record(TelemetryEventType::WebcamDegraded, json!({ "error": e.to_string() }));
            }
        }
    }

    fn start_network_guard(this: &Arc<Self>) -> Result<(), ProctorError> {
        let mut config = GuardConfig::new(this.deps.host.current_url());
        config.allowed_domains = this.config.allowed_domains.clone();
        config.block_all_external = this.config.thresholds.block_all_external_requests;

        let listener = Arc::new(NetworkBridge(Arc::downgrade(this)));
        let guard = NetworkGuard::new(config, Arc::clone(&this.deps.network), listener)?;
        if this.config.enable_clipboard_disable {
            guard.disable_clipboard();
            guard.disable_storage_access();
        }
        guard.start()?;

        *this.guard.write() = Some(Arc::new(guard));
        Ok(())
    }

    async fn stop(&self) {
        {
            let mut state = self.state.write();
            if *state == SessionState::Ended {
                return;
            }
            *state = SessionState::Ended;
        }
        log::info!("[Proctor] Stopping proctoring system...");

        if let Some(webcam) = self.webcam.read().clone() {
            webcam.stop();
        }
        if let Some(guard) = self.guard.read().clone() {
            guard.stop();
        }
        if let Some(task) = self.flush_task.lock().take() {
            task.abort();
        }
        if self.config.enable_clipboard_disable {
            self.deps.host.set_copy_paste_enabled(true);
            self.deps.host.set_text_selection_enabled(true);
        }

        // Drain what is left; stop early if the sink is failing
        while !self.queue.lock().is_empty() {
            if self.flush().await == 0 {
                break;
            }
        }

        let session_id = self.session_id.read().clone();
        if let Some(id) = session_id {
            if let Err(e) = self.deps.sink.end_session(&id).await {
                log::error!("[Proctor] Error ending session {}: {}", id, e);
            }
        }

        self.telemetry.record(
            TelemetryEventType::ProctoringStopped,
            json!({ "unsent": self.queue.lock().len() }),
        );
        log::info!("[Proctor] Proctoring system stopped");
    }

    // ========================================================================
    // VIOLATIONS
    // ========================================================================

    async fn record(
        &self,
        kind: ViolationType,
        severity: Severity,
        description: String,
        details: serde_json::Value,
    ) -> bool {
        if self.state() == SessionState::Ended {
            log::debug!("[Proctor] Session ended, dropping {}", kind);
            return false;
        }
        let session_id = match self.session_id.read().clone() {
            Some(id) => id,
            None => {
                log::warn!("[Proctor] No session yet, dropping {}", kind);
                return false;
            }
        };

        let violation = Violation::new(session_id, kind, severity, description).with_details(details);
        log::warn!(
            "[Proctor] Violation {} ({}): {}",
            violation.kind,
            violation.severity.as_str(),
            violation.description
        );
        self.tally.lock().add(&violation);
        self.telemetry.record(
            TelemetryEventType::ViolationRecorded,
            json!({ "type": kind.as_str(), "severity": severity.as_str() }),
        );
        self.queue.lock().push(violation);

        if severity.is_critical() {
            self.flush().await;
        }
        true
    }

    /// POST up to one batch. On failure the unsent remainder goes back to the
    /// front of the queue, so delivery is at-least-once.
    async fn flush(&self) -> usize {
        let _serial = self.flush_lock.lock().await;

        let batch = self.queue.lock().take_batch(self.config.thresholds.violation_batch_size.max(1));
        if batch.is_empty() {
            return 0;
        }

        let mut sent = 0;
        let mut pending = batch.into_iter();
        while let Some(violation) = pending.next() {
            if let Err(e) = self.deps.sink.record_violation(&violation).await {
                log::error!("[Proctor] Error flushing violations: {}", e);
                let mut unsent = vec![violation];
                unsent.extend(pending);
                let requeued = unsent.len();
                self.queue.lock().restore_front(unsent);
                self.telemetry.record(
                    TelemetryEventType::FlushFailed,
                    json!({ "sent": sent, "requeued": requeued, "error": e.to_string() }),
                );
                return sent;
            }
            sent += 1;
        }

        log::debug!("[Proctor] Flushed {} violations", sent);
        sent
    }

    async fn tick(&self) {
        if self.state() != SessionState::Active {
            return;
        }
        self.flush().await;

        for finding in check_session(self.deps.host.as_ref(), &self.config.thresholds) {
            self.record(finding.kind, finding.severity, finding.description.to_string(), serde_json::Value::Null)
                .await;
        }
    }

    async fn send_heartbeat(&self, heartbeat: WebcamHeartbeat) {
        if self.state() == SessionState::Ended {
            return;
        }
        let request = HeartbeatRequest {
            heartbeat,
            is_fullscreen: self.deps.host.is_fullscreen(),
        };
        // Sampled data: lost heartbeats are not re-sent
        if let Err(e) = self.deps.sink.heartbeat(&request).await {
            log::error!("[Proctor] Heartbeat error: {}", e);
        }
    }
}

fn spawn_flush_loop(inner: &Arc<CoordinatorInner>) -> JoinHandle<()> {
    let weak = Arc::downgrade(inner);
    let period = inner.config.thresholds.flush_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let inner = match weak.upgrade() {
                Some(inner) => inner,
                None => break,
            };
            if inner.state() == SessionState::Ended {
                break;
            }
            inner.tick().await;
        }
    })
}

// ============================================================================
// LISTENER BRIDGES
// ============================================================================

struct WebcamBridge(Weak<CoordinatorInner>);

#[async_trait]
impl WebcamListener for WebcamBridge {
    async fn on_violation(&self, violation: WebcamViolation) {
        if let Some(inner) = self.0.upgrade() {
            let kind = violation.kind;
            let description = violation.description();
            inner
                .record(kind, kind.default_severity(), description, violation.details)
                .await;
        }
    }

    async fn on_heartbeat(&self, heartbeat: WebcamHeartbeat) {
        if let Some(inner) = self.0.upgrade() {
            inner.send_heartbeat(heartbeat).await;
        }
    }
}

struct NetworkBridge(Weak<CoordinatorInner>);

#[async_trait]
impl NetworkListener for NetworkBridge {
    async fn on_suspicious_request(&self, request: NetworkRequest) {
        let inner = match self.0.upgrade() {
            Some(inner) => inner,
            None => return,
        };
        log::warn!("[Proctor] Network violation: {} {}", request.method, request.url);
        *inner.network_blocked.lock() += 1;

        let kind = if request.method == NAVIGATION_METHOD {
            ViolationType::ExternalNavigation
        } else {
            ViolationType::SuspiciousNetwork
        };
        inner
            .record(
                kind,
                Severity::High,
                format!("Blocked: {}", request.url),
                json!({ "method": request.method, "url": request.url, "reason": request.reason }),
            )
            .await;
    }
}
