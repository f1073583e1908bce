//! Exam-session backend request/response types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::config::ExamType;
use crate::logic::environment::BrowserInfo;
use crate::logic::webcam::WebcamHeartbeat;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub mock_test_id: String,
    pub exam_type: ExamType,
    pub browser_info: BrowserInfo,
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[serde(flatten)]
    pub heartbeat: WebcamHeartbeat,
    pub is_fullscreen: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
}

/// Backend sink errors
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error: {0}")]
    Server(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Session create response carried no session id")]
    MissingSessionId,
}
