//! Central Configuration Constants
//!
//! Single source of truth for endpoint defaults.
//! To change the default exam-session backend, only edit this file.

/// Default exam-session backend URL
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:5000/api
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Public IP echo service used when creating a session
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org?format=json";

/// Sentinel returned when the public IP cannot be resolved
pub const UNKNOWN_IP: &str = "unknown";

/// Exam-session REST routes (relative to the API URL)
pub const ROUTE_SESSION_CREATE: &str = "/exam-sessions/session/create";
pub const ROUTE_SESSION_HEARTBEAT: &str = "/exam-sessions/session/heartbeat";
pub const ROUTE_SESSION_VIOLATION: &str = "/exam-sessions/session/violation";
pub const ROUTE_SESSION_END: &str = "/exam-sessions/session/end";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Exam Proctor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get backend API URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("PROCTOR_API_URL")
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get IP echo URL from environment or use default
pub fn get_ip_echo_url() -> String {
    std::env::var("PROCTOR_IP_ECHO_URL")
        .unwrap_or_else(|_| DEFAULT_IP_ECHO_URL.to_string())
}

/// Get backend bearer token, if one is configured
pub fn get_api_token() -> Option<String> {
    std::env::var("PROCTOR_API_TOKEN").ok().filter(|s| !s.is_empty())
}
