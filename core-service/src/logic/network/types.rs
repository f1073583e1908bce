//! Network Guard Types - Data structures only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// REQUESTS
// ============================================================================

/// Audit record of one intercepted call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub id: u64,
    pub method: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NetworkRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: 0,
            method: method.into(),
            url: url.into(),
            timestamp: Utc::now(),
            blocked: false,
            reason: None,
        }
    }
}

/// Method reported for blocked link navigations
pub const NAVIGATION_METHOD: &str = "NAVIGATION";

/// Reason reported for blocked link navigations
pub const EXTERNAL_NAVIGATION_REASON: &str = "External navigation attempt";

/// Outbound HTTP call as seen by the network entry point
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

// ============================================================================
// DECISIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    Interceptor,
    SuspiciousPattern,
    ExternalBlocked,
    UnknownDomain,
    MalformedUrl,
    ExternalNavigation,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Interceptor => "Rejected by request interceptor",
            BlockReason::SuspiciousPattern => "Suspicious URL pattern",
            BlockReason::ExternalBlocked => "External request blocked",
            BlockReason::UnknownDomain => "Unknown external domain",
            BlockReason::MalformedUrl => "Malformed URL",
            BlockReason::ExternalNavigation => EXTERNAL_NAVIGATION_REASON,
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block(BlockReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

// ============================================================================
// PAGE EVENTS (hardening surface)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    SetItem,
    RemoveItem,
    Clear,
}

impl StorageOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOp::SetItem => "setItem",
            StorageOp::RemoveItem => "removeItem",
            StorageOp::Clear => "clear",
        }
    }
}

/// Document/window events the guard may intercept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Copy,
    Cut,
    Paste,
    DragOver,
    Drop,
    StorageWrite { op: StorageOp, key: String },
    BeforeUnload,
    PopState,
    LinkClick { href: String },
    WindowOpen { url: String },
}

/// What the host must do with an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventDisposition {
    Allow,
    PreventDefault,
    /// Ask the user before unloading the page
    ConfirmUnload,
    /// Push this URL back onto history to cancel back/forward
    RepushUrl(String),
    /// `window.open` returns nothing
    Suppressed,
    /// Throw this error to the calling code
    Raise(NetworkGuardError),
}

// ============================================================================
// CONFIG & ERRORS
// ============================================================================

/// Domains always reachable during an exam
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "cdn.jsdelivr.net",
    "cdnjs.cloudflare.com",
    "cdn.tailwindcss.com",
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "unpkg.com",
];

#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// URL of the exam page; decides same-origin
    pub page_url: String,
    pub allowed_domains: Vec<String>,
    pub block_all_external: bool,
}

impl GuardConfig {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            allowed_domains: Vec::new(),
            block_all_external: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkGuardError {
    #[error("Network request blocked during exam: {url}")]
    Blocked { url: String },
    #[error("localStorage access disabled during exam ({op} {key})")]
    StorageDenied { op: &'static str, key: String },
    #[error("Network guard already started")]
    AlreadyStarted,
    #[error("Invalid page URL: {0}")]
    InvalidPageUrl(String),
    #[error("Transport error: {0}")]
    Transport(String),
}
