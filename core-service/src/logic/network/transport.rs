//! Network entry point & middleware
//!
//! Every outbound call of the exam page goes through one `NetworkEntryPoint`.
//! The guard swaps a `GuardedTransport` in on start and puts the previous
//! transport back on stop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::types::{HttpRequest, HttpResponse, NetworkGuardError};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, NetworkGuardError>;
}

/// XHR-style request that can be cancelled after `open`
pub trait XhrRequest: Send + Sync {
    fn abort(&self);
}

// ============================================================================
// ENTRY POINT
// ============================================================================

pub struct NetworkEntryPoint {
    current: RwLock<Arc<dyn Transport>>,
}

impl NetworkEntryPoint {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            current: RwLock::new(transport),
        }
    }

    pub fn current(&self) -> Arc<dyn Transport> {
        self.current.read().clone()
    }

    /// Install `transport`, returning the one it replaces
    pub fn install(&self, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        std::mem::replace(&mut *self.current.write(), transport)
    }

    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, NetworkGuardError> {
        let transport = self.current();
        transport.fetch(request).await
    }
}

// ============================================================================
// REQWEST TRANSPORT
// ============================================================================

/// Plain HTTP transport used when nothing is guarding the page
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, NetworkGuardError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkGuardError::Transport(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, NetworkGuardError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkGuardError::Transport(e.to_string()))?;

        let mut builder = self.http_client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkGuardError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkGuardError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// ============================================================================
// GUARDED TRANSPORT
// ============================================================================

/// Evaluates every request before handing it to the wrapped transport
pub struct GuardedTransport {
    inner: Arc<dyn Transport>,
    core: Arc<super::guard::GuardCore>,
}

impl GuardedTransport {
    pub(crate) fn new(inner: Arc<dyn Transport>, core: Arc<super::guard::GuardCore>) -> Self {
        Self { inner, core }
    }
}

#[async_trait]
impl Transport for GuardedTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, NetworkGuardError> {
        if !self.core.check_and_report(&request.method, &request.url).await {
            return Err(NetworkGuardError::Blocked { url: request.url });
        }
        self.inner.fetch(request).await
    }
}
