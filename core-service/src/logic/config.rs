//! Proctoring Thresholds & Policy
//!
//! Tuned thresholds, timeouts and policy toggles consumed by every component.
//! Supplied at construction time and never mutated afterwards.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// EXAM TYPE
// ============================================================================

/// Exam board a mock test belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "WAEC")]
    Waec,
    #[serde(rename = "JAMB")]
    Jamb,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Waec => "WAEC",
            ExamType::Jamb => "JAMB",
        }
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WAEC" => Ok(ExamType::Waec),
            "JAMB" => Ok(ExamType::Jamb),
            other => Err(format!("unknown exam type: {}", other)),
        }
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Thresholds and policy toggles for a proctored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProctorThresholds {
    // Webcam
    /// Max time to acquire the camera (ms)
    pub webcam_timeout_ms: u64,
    /// How long face detection calibrates before results are trusted (ms)
    pub face_detection_warmup_ms: u64,
    /// Minimum confidence for a valid face (0-1)
    pub face_confidence_threshold: f32,
    /// Minimum FPS for reliable detection
    pub face_detection_fps_min: f32,
    /// Consecutive no-face ticks tolerated before a violation
    pub face_continuity_frames: u32,
    /// Minimum time between two analysed frames (ms)
    pub analyze_interval_ms: u64,
    /// Same violation type may not re-fire inside this window (ms)
    pub violation_cooldown_ms: u64,
    /// Emit a detection heartbeat every N analysed frames
    pub heartbeat_every_frames: u64,

    // Risk scoring (0-100)
    pub risk_score_warning_threshold: u8,
    pub risk_score_block_threshold: u8,

    // Browser & security
    pub block_lockdown_browser_absent: bool,
    pub allow_virtual_environment: bool,
    pub require_fullscreen: bool,
    pub require_camera: bool,
    #[serde(rename = "requireSEB")]
    pub require_seb: bool,
    /// Outer/inner window delta that suggests docked dev tools (px)
    pub dev_tools_threshold_px: u32,

    // Network
    pub network_timeout_ms: u64,
    pub block_all_external_requests: bool,
    /// Per-call timeout for backend sink requests (ms)
    pub backend_timeout_ms: u64,

    // Violation batching
    pub violation_flush_interval_ms: u64,
    pub violation_batch_size: usize,

    // Session management
    pub session_heartbeat_interval_ms: u64,
    pub session_inactivity_timeout_ms: u64,

    // Retry logic
    pub max_preflight_retries: u32,
    pub preflight_retry_delay_ms: u64,
}

impl Default for ProctorThresholds {
    fn default() -> Self {
        Self {
            webcam_timeout_ms: 10_000,
            face_detection_warmup_ms: 3_000,
            face_confidence_threshold: 0.5,
            face_detection_fps_min: 5.0,
            face_continuity_frames: 10,
            analyze_interval_ms: 500,
            violation_cooldown_ms: 3_000,
            heartbeat_every_frames: 10,

            risk_score_warning_threshold: 50,
            risk_score_block_threshold: 80,

            block_lockdown_browser_absent: false,
            allow_virtual_environment: true,
            require_fullscreen: true,
            require_camera: true,
            require_seb: false,
            dev_tools_threshold_px: 160,

            network_timeout_ms: 5_000,
            block_all_external_requests: true,
            backend_timeout_ms: 10_000,

            violation_flush_interval_ms: 30_000,
            violation_batch_size: 10,

            session_heartbeat_interval_ms: 5_000,
            session_inactivity_timeout_ms: 1_800_000,

            max_preflight_retries: 2,
            preflight_retry_delay_ms: 2_000,
        }
    }
}

impl ProctorThresholds {
    /// Thresholds for a specific exam board
    pub fn for_exam(exam_type: ExamType) -> Self {
        // Both boards currently share the defaults
        match exam_type {
            ExamType::Waec | ExamType::Jamb => Self::default(),
        }
    }

    /// Defaults overlaid with `PROCTOR_*` environment variables
    pub fn from_env() -> Self {
        let mut t = Self::default();

        override_from_env(&mut t.webcam_timeout_ms, "PROCTOR_WEBCAM_TIMEOUT_MS");
        override_from_env(&mut t.face_detection_warmup_ms, "PROCTOR_FACE_WARMUP_MS");
        override_from_env(&mut t.face_confidence_threshold, "PROCTOR_FACE_CONFIDENCE");
        override_from_env(&mut t.face_detection_fps_min, "PROCTOR_FACE_FPS_MIN");
        override_from_env(&mut t.face_continuity_frames, "PROCTOR_FACE_CONTINUITY_FRAMES");
        override_from_env(&mut t.analyze_interval_ms, "PROCTOR_ANALYZE_INTERVAL_MS");
        override_from_env(&mut t.violation_cooldown_ms, "PROCTOR_VIOLATION_COOLDOWN_MS");
        override_from_env(&mut t.heartbeat_every_frames, "PROCTOR_HEARTBEAT_EVERY_FRAMES");
        override_from_env(&mut t.risk_score_warning_threshold, "PROCTOR_RISK_WARNING");
        override_from_env(&mut t.risk_score_block_threshold, "PROCTOR_RISK_BLOCK");
        override_from_env(&mut t.block_lockdown_browser_absent, "PROCTOR_BLOCK_LOCKDOWN_ABSENT");
        override_from_env(&mut t.allow_virtual_environment, "PROCTOR_ALLOW_VM");
        override_from_env(&mut t.require_fullscreen, "PROCTOR_REQUIRE_FULLSCREEN");
        override_from_env(&mut t.require_camera, "PROCTOR_REQUIRE_CAMERA");
        override_from_env(&mut t.require_seb, "PROCTOR_REQUIRE_SEB");
        override_from_env(&mut t.dev_tools_threshold_px, "PROCTOR_DEVTOOLS_THRESHOLD_PX");
        override_from_env(&mut t.network_timeout_ms, "PROCTOR_NETWORK_TIMEOUT_MS");
        override_from_env(&mut t.block_all_external_requests, "PROCTOR_BLOCK_ALL_EXTERNAL");
        override_from_env(&mut t.backend_timeout_ms, "PROCTOR_BACKEND_TIMEOUT_MS");
        override_from_env(&mut t.violation_flush_interval_ms, "PROCTOR_FLUSH_INTERVAL_MS");
        override_from_env(&mut t.violation_batch_size, "PROCTOR_BATCH_SIZE");
        override_from_env(&mut t.session_heartbeat_interval_ms, "PROCTOR_HEARTBEAT_INTERVAL_MS");
        override_from_env(&mut t.session_inactivity_timeout_ms, "PROCTOR_INACTIVITY_TIMEOUT_MS");
        override_from_env(&mut t.max_preflight_retries, "PROCTOR_PREFLIGHT_RETRIES");
        override_from_env(&mut t.preflight_retry_delay_ms, "PROCTOR_PREFLIGHT_RETRY_DELAY_MS");

        t
    }

    pub fn webcam_timeout(&self) -> Duration {
        Duration::from_millis(self.webcam_timeout_ms)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.violation_flush_interval_ms.max(1))
    }

    pub fn preflight_retry_delay(&self) -> Duration {
        Duration::from_millis(self.preflight_retry_delay_ms)
    }
}

/// Replace `slot` with the parsed env value, keeping the default when unset or invalid
fn override_from_env<T: FromStr>(slot: &mut T, key: &str) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => log::warn!("Ignoring invalid value for {}: {:?}", key, raw),
        }
    }
}
