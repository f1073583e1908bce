//! Exam Telemetry Event
//!
//! One timestamped lifecycle event of a proctored session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEventType {
    SessionCreated,
    SessionCreateFailed,
    AdmissionAssessed,
    AdmissionBlocked,
    WebcamDegraded,
    ProctoringStarted,
    ViolationRecorded,
    FlushFailed,
    ProctoringStopped,
}

impl TelemetryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEventType::SessionCreated => "session_created",
            TelemetryEventType::SessionCreateFailed => "session_create_failed",
            TelemetryEventType::AdmissionAssessed => "admission_assessed",
            TelemetryEventType::AdmissionBlocked => "admission_blocked",
            TelemetryEventType::WebcamDegraded => "webcam_degraded",
            TelemetryEventType::ProctoringStarted => "proctoring_started",
            TelemetryEventType::ViolationRecorded => "violation_recorded",
            TelemetryEventType::FlushFailed => "flush_failed",
            TelemetryEventType::ProctoringStopped => "proctoring_stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: TelemetryEventType,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl TelemetryEvent {
    pub fn new(event_type: TelemetryEventType, details: serde_json::Value) -> Self {
        Self {
            ts: Utc::now(),
            event_type,
            details,
        }
    }

    /// Single JSON line, no trailing newline
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
