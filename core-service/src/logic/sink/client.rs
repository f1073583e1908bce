//! Exam-session API Client
//!
//! HTTP client for the exam-session REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::config::ProctorThresholds;
use crate::logic::violation::Violation;

use super::types::*;

// ============================================================================
// SINK SEAM
// ============================================================================

/// Where sessions, heartbeats and violations are persisted
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<String, SinkError>;

    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), SinkError>;

    async fn record_violation(&self, violation: &Violation) -> Result<(), SinkError>;

    async fn end_session(&self, session_id: &str) -> Result<(), SinkError>;

    /// Public IP of this client. Never fails: returns "unknown" instead.
    async fn public_ip(&self) -> String {
        constants::UNKNOWN_IP.to_string()
    }
}

// ============================================================================
// HTTP SINK
// ============================================================================

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub api_url: String,
    pub ip_echo_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl SinkConfig {
    /// Endpoints from the environment, per-call timeout from `backend_timeout_ms`
    pub fn from_thresholds(thresholds: &ProctorThresholds) -> Self {
        Self {
            api_url: constants::get_api_url(),
            ip_echo_url: constants::get_ip_echo_url(),
            token: constants::get_api_token(),
            timeout: thresholds.backend_timeout(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::from_thresholds(&ProctorThresholds::default())
    }
}

pub struct HttpSessionSink {
    config: SinkConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IpEchoResponse {
    ip: String,
}

impl HttpSessionSink {
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::Network(e.to_string()))?;

        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), route)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<reqwest::Response, SinkError> {
        let mut request = self.http_client.post(self.endpoint(route)).json(body);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(SinkError::Server(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl SessionSink for HttpSessionSink {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<String, SinkError> {
        log::info!(
            "Creating exam session: mock test {} ({})",
            request.mock_test_id,
            request.exam_type
        );

        let response: CreateSessionResponse = self
            .post_json(constants::ROUTE_SESSION_CREATE, request)
            .await?
            .json()
            .await
            .map_err(|e| SinkError::Parse(e.to_string()))?;

        response
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or(SinkError::MissingSessionId)
    }

    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), SinkError> {
        self.post_json(constants::ROUTE_SESSION_HEARTBEAT, request).await?;
        Ok(())
    }

    async fn record_violation(&self, violation: &Violation) -> Result<(), SinkError> {
        self.post_json(constants::ROUTE_SESSION_VIOLATION, violation).await?;
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), SinkError> {
        let body = EndSessionRequest {
            session_id: session_id.to_string(),
        };
        self.post_json(constants::ROUTE_SESSION_END, &body).await?;
        Ok(())
    }

    async fn public_ip(&self) -> String {
        let lookup = async {
            let response = self
                .http_client
                .get(&self.config.ip_echo_url)
                .send()
                .await
                .map_err(|e| SinkError::Network(e.to_string()))?;
            response
                .json::<IpEchoResponse>()
                .await
                .map_err(|e| SinkError::Parse(e.to_string()))
        };

        match lookup.await {
            Ok(echo) => echo.ip,
            Err(e) => {
                log::debug!("Public IP lookup failed: {}", e);
                constants::UNKNOWN_IP.to_string()
            }
        }
    }
}
