//! Browser Identification
//!
//! User-agent parsing and lockdown/proctoring-monitor markers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::probe::EnvironmentProbe;

// ============================================================================
// MARKERS
// ============================================================================

/// UA substrings of dedicated lockdown browsers
pub const LOCKDOWN_UA_MARKERS: &[&str] = &["lockdown", "respondus", "examplify"];

/// Globals only present inside lockdown browsers
pub const LOCKDOWN_GLOBALS: &[&str] = &["respondusLDB", "LDB", "secureExam"];

/// UA substrings of recognised proctoring monitors
pub const MONITOR_UA_MARKERS: &[&str] = &["respondus", "proctortrack", "examity", "exammonitor"];

/// Globals exposed by proctoring monitors
pub const MONITOR_GLOBALS: &[&str] = &["respondusMonitor", "proctorAPIAvailable"];

static FIREFOX_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Firefox/([\d.]+)").unwrap());
static CHROME_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Chrome/([\d.]+)").unwrap());
static SAFARI_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Version/([\d.]+)").unwrap());
static EDGE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Edg/([\d.]+)").unwrap());
static OPERA_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"OPR/([\d.]+)").unwrap());

const UNKNOWN: &str = "Unknown";

// ============================================================================
// PARSING
// ============================================================================

/// Browser name and version from a user agent. First match wins, in the
/// order Firefox, Chrome (not Chromium), Safari, Edge, Opera.
pub fn parse_user_agent(ua: &str) -> (String, String) {
    let (name, pattern): (&str, &Lazy<Regex>) = if ua.contains("Firefox") {
        ("Firefox", &FIREFOX_VERSION)
    } else if ua.contains("Chrome") && !ua.contains("Chromium") {
        ("Chrome", &CHROME_VERSION)
    } else if ua.contains("Safari") {
        ("Safari", &SAFARI_VERSION)
    } else if ua.contains("Edge") {
        ("Edge", &EDGE_VERSION)
    } else if ua.contains("Opera") {
        ("Opera", &OPERA_VERSION)
    } else {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    };

    let version = pattern
        .captures(ua)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    (name.to_string(), version)
}

pub fn detect_lockdown_browser(probe: &dyn EnvironmentProbe) -> bool {
    let ua = probe.user_agent().to_lowercase();
    LOCKDOWN_UA_MARKERS.iter().any(|m| ua.contains(m))
        || LOCKDOWN_GLOBALS.iter().any(|g| probe.has_global(g))
}

pub fn detect_proctoring_monitor(probe: &dyn EnvironmentProbe) -> bool {
    let ua = probe.user_agent().to_lowercase();
    MONITOR_UA_MARKERS.iter().any(|m| ua.contains(m))
        || MONITOR_GLOBALS.iter().any(|g| probe.has_global(g))
}
