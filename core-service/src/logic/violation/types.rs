//! Violation Types
//!
//! Core types cho violation records.
//! KHÔNG chứa logic - chỉ data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// VIOLATION TYPE
// ============================================================================

/// Classified kind of suspected cheating behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    MultipleFaces,
    FaceNotDetected,
    LowFaceConfidence,
    WebcamAccessDenied,
    FaceDetectionModelFailed,
    SuspiciousNetwork,
    SecurityThreat,
    PageVisibilityHidden,
    DeveloperTools,
    StartupError,
    ExternalNavigation,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::MultipleFaces => "multiple_faces",
            ViolationType::FaceNotDetected => "face_not_detected",
            ViolationType::LowFaceConfidence => "low_face_confidence",
            ViolationType::WebcamAccessDenied => "webcam_access_denied",
            ViolationType::FaceDetectionModelFailed => "face_detection_model_failed",
            ViolationType::SuspiciousNetwork => "suspicious_network",
            ViolationType::SecurityThreat => "security_threat",
            ViolationType::PageVisibilityHidden => "page_visibility_hidden",
            ViolationType::DeveloperTools => "developer_tools",
            ViolationType::StartupError => "startup_error",
            ViolationType::ExternalNavigation => "external_navigation",
        }
    }

    /// Severity used when the reporter does not pick one explicitly
    pub fn default_severity(&self) -> Severity {
        match self {
            ViolationType::MultipleFaces
            | ViolationType::SecurityThreat
            | ViolationType::DeveloperTools => Severity::Critical,
            ViolationType::FaceNotDetected
            | ViolationType::SuspiciousNetwork
            | ViolationType::PageVisibilityHidden
            | ViolationType::StartupError
            | ViolationType::ExternalNavigation => Severity::High,
            ViolationType::LowFaceConfidence
            | ViolationType::WebcamAccessDenied
            | ViolationType::FaceDetectionModelFailed => Severity::Medium,
        }
    }

    /// Raised by the webcam monitor
    pub fn is_webcam(&self) -> bool {
        matches!(
            self,
            ViolationType::MultipleFaces
                | ViolationType::FaceNotDetected
                | ViolationType::LowFaceConfidence
                | ViolationType::WebcamAccessDenied
                | ViolationType::FaceDetectionModelFailed
        )
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VIOLATION RECORD
// ============================================================================

/// A classified, severity-tagged record sent to the violation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Client-generated id so the backend can drop duplicate deliveries
    pub id: Uuid,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    pub fn new(
        session_id: impl Into<String>,
        kind: ViolationType,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            kind,
            severity,
            description: description.into(),
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let v = Violation::new("SESS_1", ViolationType::SuspiciousNetwork, Severity::High, "Blocked: x");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["sessionId"], "SESS_1");
        assert_eq!(json["type"], "suspicious_network");
        assert_eq!(json["severity"], "high");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(ViolationType::MultipleFaces.default_severity(), Severity::Critical);
        assert_eq!(ViolationType::FaceNotDetected.default_severity(), Severity::High);
        assert_eq!(ViolationType::LowFaceConfidence.default_severity(), Severity::Medium);
    }
}
