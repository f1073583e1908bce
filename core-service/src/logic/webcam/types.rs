//! Webcam Types - Data structures only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::violation::ViolationType;

// ============================================================================
// FRAMES & DETECTIONS
// ============================================================================

/// One decoded video frame
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Vec::new(),
        }
    }

    /// Video element has no decoded frame yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A single face reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub probability: Option<f32>,
}

impl FaceDetection {
    pub fn new(start: (f32, f32), end: (f32, f32), probability: Option<f32>) -> Self {
        Self { start, end, probability }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBounds {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

/// Confidence assumed when the detector reports a face without a probability
pub const DEFAULT_FACE_CONFIDENCE: f32 = 0.9;

/// Per-tick detection snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectionResult {
    pub face_detected: bool,
    pub confidence: f32,
    pub face_count: usize,
    pub multiple_faces: bool,
    pub fps: f32,
    pub face_bounds: Vec<FaceBounds>,
}

impl FaceDetectionResult {
    pub fn from_detections(detections: &[FaceDetection], fps: f32) -> Self {
        let confidence = detections
            .first()
            .map(|face| face.probability.unwrap_or(DEFAULT_FACE_CONFIDENCE))
            .unwrap_or(0.0);

        Self {
            face_detected: !detections.is_empty(),
            confidence,
            face_count: detections.len(),
            multiple_faces: detections.len() > 1,
            fps,
            face_bounds: detections
                .iter()
                .map(|d| FaceBounds { start: d.start, end: d.end })
                .collect(),
        }
    }
}

// ============================================================================
// LISTENER PAYLOADS
// ============================================================================

/// Detection summary carried by a heartbeat
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebcamData {
    pub face_detected: bool,
    pub confidence: f32,
    pub multiple_faces: bool,
    pub face_count: usize,
    pub fps: f32,
}

impl From<&FaceDetectionResult> for WebcamData {
    fn from(result: &FaceDetectionResult) -> Self {
        Self {
            face_detected: result.face_detected,
            confidence: result.confidence,
            multiple_faces: result.multiple_faces,
            face_count: result.face_count,
            fps: result.fps,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebcamHeartbeat {
    pub session_id: String,
    pub webcam_data: WebcamData,
    pub timestamp: DateTime<Utc>,
}

/// Violation raised by the monitor, before the coordinator turns it into a `Violation`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebcamViolation {
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub frame_number: u64,
    /// Milliseconds since monitoring started
    pub timestamp_ms: u64,
    pub details: serde_json::Value,
}

impl WebcamViolation {
    /// The reported error message if there is one, else the type name
    pub fn description(&self) -> String {
        self.details
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.kind.as_str().to_string())
    }
}

// ============================================================================
// STATE & STATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebcamState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

impl WebcamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebcamState::Uninitialized => "uninitialized",
            WebcamState::Initialized => "initialized",
            WebcamState::Running => "running",
            WebcamState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for WebcamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebcamStats {
    pub frame_count: u64,
    pub fps: f32,
    pub uptime_ms: u64,
    pub is_active: bool,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum WebcamError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("Camera did not start within {0} ms")]
    CameraTimeout(u64),
    #[error("Face detection model failed: {0}")]
    ModelFailed(String),
    #[error("Face detection failed: {0}")]
    Detection(String),
    #[error("Invalid webcam state: {0}")]
    InvalidState(WebcamState),
}
