//! Proctor Types - Data structures only

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::logic::config::{ExamType, ProctorThresholds};
use crate::logic::network::NetworkGuardError;
use crate::logic::sink::SinkError;
use crate::logic::violation::ViolationType;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProctorConfig {
    pub mock_test_id: String,
    pub exam_type: ExamType,
    pub enable_webcam: bool,
    pub enable_network_monitoring: bool,
    /// Clipboard, drag-and-drop, storage and text-selection lockdown
    pub enable_clipboard_disable: bool,
    pub thresholds: ProctorThresholds,
    /// Added to the network allow-list
    pub allowed_domains: Vec<String>,
}

impl ProctorConfig {
    pub fn new(mock_test_id: impl Into<String>, exam_type: ExamType) -> Self {
        Self {
            mock_test_id: mock_test_id.into(),
            exam_type,
            enable_webcam: true,
            enable_network_monitoring: true,
            enable_clipboard_disable: true,
            thresholds: ProctorThresholds::for_exam(exam_type),
            allowed_domains: Vec::new(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ProctorThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Inactive,
    Active,
    Ended,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Active => "active",
            SessionState::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// STATUS & METRICS
// ============================================================================

/// Aggregate-only view for a status overlay. Never carries violation content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorStatus {
    pub is_active: bool,
    pub webcam: bool,
    pub network_monitoring: bool,
    /// Violations waiting to be flushed
    pub violations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebcamStatus {
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRiskLevel {
    Normal,
    Warning,
    Flagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionRisk {
    pub score: u8,
    pub level: SessionRiskLevel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorMetrics {
    pub session_id: Option<String>,
    pub state: SessionState,
    pub total_violations: u32,
    pub violations_by_type: HashMap<ViolationType, u32>,
    pub webcam_status: WebcamStatus,
    pub network_blocked: u32,
    /// Admission score from the environment assessment
    pub admission_risk_score: Option<u8>,
    pub session_risk: SessionRisk,
    pub last_update: DateTime<Utc>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum ProctorError {
    #[error("Session cannot start from state {0}")]
    InvalidState(SessionState),
    #[error("Failed to create exam session: {0}")]
    SessionCreate(SinkError),
    #[error("Admission blocked: risk score {0}")]
    AdmissionBlocked(u8),
    #[error("Network guard failed: {0}")]
    Network(#[from] NetworkGuardError),
}
