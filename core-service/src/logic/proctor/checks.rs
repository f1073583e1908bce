//! Session-level checks run on every flush tick

use crate::logic::config::ProctorThresholds;
use crate::logic::violation::{Severity, ViolationType};

use super::host::PageHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFinding {
    pub kind: ViolationType,
    pub severity: Severity,
    pub description: &'static str,
}

/// Visibility and dev-tools checks against the current page state
pub fn check_session(host: &dyn PageHost, thresholds: &ProctorThresholds) -> Vec<SessionFinding> {
    let mut findings = Vec::new();

    if host.is_hidden() {
        findings.push(SessionFinding {
            kind: ViolationType::PageVisibilityHidden,
            severity: Severity::High,
            description: "Page is hidden/minimized",
        });
    }

    // Heuristic, trivially bypassed with detached dev tools
    if host.window_metrics().suggests_dev_tools(thresholds.dev_tools_threshold_px) {
        findings.push(SessionFinding {
            kind: ViolationType::DeveloperTools,
            severity: Severity::Critical,
            description: "Developer tools detected",
        });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::proctor::host::WindowMetrics;
    use crate::logic::testing::FakePageHost;

    #[test]
    fn test_quiet_page_has_no_findings() {
        let host = FakePageHost::default();
        assert!(check_session(&host, &ProctorThresholds::default()).is_empty());
    }

    #[test]
    fn test_hidden_page() {
        let host = FakePageHost::default();
        host.set_hidden(true);
        let findings = check_session(&host, &ProctorThresholds::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ViolationType::PageVisibilityHidden);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_dev_tools_threshold_is_strict() {
        let host = FakePageHost::default();
        host.set_metrics(WindowMetrics {
            outer_width: 1920,
            outer_height: 1080,
            inner_width: 1920,
            inner_height: 920,
        });
        // delta 160 == threshold: not flagged
        assert!(check_session(&host, &ProctorThresholds::default()).is_empty());

        host.set_metrics(WindowMetrics {
            outer_width: 1920,
            outer_height: 1080,
            inner_width: 1700,
            inner_height: 1000,
        });
        let findings = check_session(&host, &ProctorThresholds::default());
        assert_eq!(findings[0].kind, ViolationType::DeveloperTools);
        assert!(findings[0].severity.is_critical());
    }
}
