//! Environment Assessor
//!
//! One-shot admission check: browser identity, virtualization signals and
//! device permissions, folded into a 0-100 risk score and a recommendation.
//! Side-effect free apart from device enumeration.

use std::sync::Arc;
use std::time::Duration;

use super::browser::{detect_lockdown_browser, detect_proctoring_monitor, parse_user_agent};
use super::probe::EnvironmentProbe;
use super::types::*;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Hypervisor names that leak into the user agent
pub const HYPERVISOR_MARKERS: &[&str] = &["virtualbox", "vmware", "hyperv", "xen", "kvm", "parallels"];

/// Screen sizes VMs commonly boot with
pub const VM_RESOLUTIONS: &[(u32, u32)] = &[(1024, 768), (800, 600)];

/// Below this reported memory (GB) counts as a VM signal
pub const LOW_MEMORY_GB: f64 = 2.0;

/// More than this many signals flags a virtual environment
pub const VM_SIGNAL_THRESHOLD: usize = 2;

const EXTENSION_GLOBAL: &str = "chrome.runtime.id";

// Category weights
const BROWSER_WEIGHT: u8 = 40;
const ENVIRONMENT_WEIGHT: u8 = 40;
const PERMISSIONS_WEIGHT: u8 = 30;
const DETECTION_WEIGHT: u8 = 30;

// ============================================================================
// ASSESSOR
// ============================================================================

pub struct EnvironmentAssessor {
    probe: Arc<dyn EnvironmentProbe>,
    device_timeout: Duration,
}

impl EnvironmentAssessor {
    pub fn new(probe: Arc<dyn EnvironmentProbe>, device_timeout: Duration) -> Self {
        Self { probe, device_timeout }
    }

    /// Browser identity and capabilities
    pub async fn identify_browser(&self) -> BrowserInfo {
        let ua = self.probe.user_agent();
        let (name, version) = parse_user_agent(&ua);
        let (can_access_camera, can_access_microphone) = self.check_media_devices().await;

        BrowserInfo {
            name,
            version,
            user_agent: ua,
            is_lockdown_browser: detect_lockdown_browser(self.probe.as_ref()),
            is_respondus_monitor: detect_proctoring_monitor(self.probe.as_ref()),
            is_fullscreen_capable: self.probe.is_fullscreen_capable(),
            is_fullscreen_mode: self.probe.is_fullscreen(),
            can_access_camera,
            can_access_microphone,
            can_disable_copy_paste: self.probe.can_disable_copy_paste(),
        }
    }

    /// (camera, microphone) availability. Fails open: if devices cannot be
    /// listed, assume both are available rather than block on a false negative.
    async fn check_media_devices(&self) -> (bool, bool) {
        match tokio::time::timeout(self.device_timeout, self.probe.enumerate_devices()).await {
            Ok(Ok(devices)) => (
                devices.iter().any(|d| d.kind == MediaDeviceKind::VideoInput),
                devices.iter().any(|d| d.kind == MediaDeviceKind::AudioInput),
            ),
            Ok(Err(e)) => {
                log::warn!("Device enumeration failed ({}), assuming camera/microphone available", e);
                (true, true)
            }
            Err(_) => {
                log::warn!(
                    "Device enumeration timed out after {:?}, assuming camera/microphone available",
                    self.device_timeout
                );
                (true, true)
            }
        }
    }

    /// Number of virtualization signals that fired
    pub fn virtualization_signals(&self) -> usize {
        let ua = self.probe.user_agent().to_lowercase();
        let screen = self.probe.screen();

        let mut signals = HYPERVISOR_MARKERS.iter().filter(|m| ua.contains(*m)).count();

        if VM_RESOLUTIONS
            .iter()
            .any(|&(w, h)| screen.avail_width == w && screen.avail_height == h)
        {
            signals += 1;
        }

        // Unreported memory counts as 0
        if self.probe.device_memory_gb().unwrap_or(0.0) < LOW_MEMORY_GB {
            signals += 1;
        }

        signals
    }

    /// Strict majority: more than two signals, not "any"
    pub fn detect_virtual_environment(&self) -> bool {
        self.virtualization_signals() > VM_SIGNAL_THRESHOLD
    }

    pub fn detect_suspicious_extensions(&self) -> Vec<String> {
        let mut found = Vec::new();
        if self.probe.has_global(EXTENSION_GLOBAL) {
            found.push("Chrome extension environment detected".to_string());
        }
        found
    }

    /// Browser-only risk with warnings for the issue list
    pub fn assess_browser_risk(&self, info: &BrowserInfo) -> BrowserRisk {
        let mut score: u16 = 0;
        let mut warnings = Vec::new();

        if !info.is_secured() {
            score += 30;
            warnings.push("Not using dedicated lockdown browser".to_string());
        }

        if !info.is_fullscreen_mode {
            score += 15;
            warnings.push("Not in fullscreen mode".to_string());
        }

        if !info.can_access_camera {
            score += 20;
            warnings.push("Cannot access camera for monitoring".to_string());
        }

        if info.name == "Firefox" || info.name == "Opera" {
            score += 10;
            warnings.push(format!("{} browser (less secure for exams)", info.name));
        }

        BrowserRisk {
            score: score.min(100) as u8,
            warnings,
        }
    }

    /// Full admission assessment
    pub async fn assess(&self) -> RiskAssessment {
        let info = self.identify_browser().await;
        self.assess_with(&info)
    }

    /// Assessment for an already identified browser
    pub fn assess_with(&self, info: &BrowserInfo) -> RiskAssessment {
        let browser_risk = self.assess_browser_risk(info);
        let is_virtual = self.detect_virtual_environment();
        let extensions = self.detect_suspicious_extensions();

        let mut issues = browser_risk.warnings;
        if is_virtual {
            issues.push("Virtual machine or emulator detected".to_string());
        }
        issues.extend(extensions.iter().cloned());

        let categories = CategoryScores {
            browser: if info.is_secured() { 0 } else { BROWSER_WEIGHT },
            environment: if is_virtual { ENVIRONMENT_WEIGHT } else { 0 },
            permissions: if info.can_access_camera { 0 } else { PERMISSIONS_WEIGHT },
            detection: if extensions.is_empty() { 0 } else { DETECTION_WEIGHT },
        };

        let overall = categories.total();
        let recommendation = Recommendation::from_score(overall);

        log::info!(
            "Environment assessment: overall={} ({:?}) -> {}",
            overall,
            categories,
            recommendation
        );

        RiskAssessment {
            overall,
            categories,
            issues,
            recommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::environment::EnvironmentSnapshot;

    const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    fn camera() -> MediaDeviceInfo {
        MediaDeviceInfo { kind: MediaDeviceKind::VideoInput, label: "cam".into() }
    }

    fn clean_snapshot() -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            user_agent: CHROME_UA.to_string(),
            globals: vec![],
            screen: ScreenMetrics { avail_width: 1920, avail_height: 1040 },
            device_memory_gb: Some(8.0),
            fullscreen_capable: true,
            fullscreen: true,
            copy_paste_disable: true,
            devices: Some(vec![camera()]),
        }
    }

    fn assessor(snapshot: EnvironmentSnapshot) -> EnvironmentAssessor {
        EnvironmentAssessor::new(Arc::new(snapshot), Duration::from_millis(200))
    }

    #[test]
    fn test_recommendation_breakpoints() {
        assert_eq!(Recommendation::from_score(0), Recommendation::Safe);
        assert_eq!(Recommendation::from_score(40), Recommendation::Safe);
        assert_eq!(Recommendation::from_score(41), Recommendation::Caution);
        assert_eq!(Recommendation::from_score(70), Recommendation::Caution);
        assert_eq!(Recommendation::from_score(71), Recommendation::Blocked);
        assert_eq!(Recommendation::from_score(100), Recommendation::Blocked);
    }

    #[test]
    fn test_recommendation_exhaustive() {
        for s in 0..=100u8 {
            let expected = if s > 70 {
                Recommendation::Blocked
            } else if s > 40 {
                Recommendation::Caution
            } else {
                Recommendation::Safe
            };
            assert_eq!(Recommendation::from_score(s), expected, "score {}", s);
        }
    }

    #[test]
    fn test_vm_requires_more_than_two_signals() {
        // Two signals: VM resolution + low memory
        let mut snap = clean_snapshot();
        snap.screen = ScreenMetrics { avail_width: 1024, avail_height: 768 };
        snap.device_memory_gb = Some(1.0);
        let a = assessor(snap.clone());
        assert_eq!(a.virtualization_signals(), 2);
        assert!(!a.detect_virtual_environment());

        // Third signal: hypervisor in UA
        snap.user_agent = format!("{} VirtualBox", CHROME_UA);
        let a = assessor(snap);
        assert_eq!(a.virtualization_signals(), 3);
        assert!(a.detect_virtual_environment());
    }

    #[test]
    fn test_missing_memory_counts_as_signal() {
        let mut snap = clean_snapshot();
        snap.device_memory_gb = None;
        assert_eq!(assessor(snap).virtualization_signals(), 1);
    }

    #[tokio::test]
    async fn test_enumeration_failure_fails_open() {
        let mut snap = clean_snapshot();
        snap.devices = None;
        let info = assessor(snap).identify_browser().await;
        assert!(info.can_access_camera);
        assert!(info.can_access_microphone);
    }

    #[tokio::test]
    async fn test_plain_browser_is_safe_at_forty() {
        let assessment = assessor(clean_snapshot()).assess().await;
        assert_eq!(assessment.categories.browser, 40);
        assert_eq!(assessment.overall, 40);
        assert_eq!(assessment.recommendation, Recommendation::Safe);
        assert!(assessment.issues.iter().any(|i| i == "Not using dedicated lockdown browser"));
    }

    #[tokio::test]
    async fn test_no_camera_plain_browser_is_caution() {
        let mut snap = clean_snapshot();
        snap.devices = Some(vec![]);
        let assessment = assessor(snap).assess().await;
        assert_eq!(assessment.categories.permissions, 30);
        assert_eq!(assessment.overall, 70);
        assert_eq!(assessment.recommendation, Recommendation::Caution);
    }

    #[tokio::test]
    async fn test_vm_plain_browser_is_blocked() {
        let mut snap = clean_snapshot();
        snap.user_agent = format!("{} VMware", CHROME_UA);
        snap.screen = ScreenMetrics { avail_width: 800, avail_height: 600 };
        snap.device_memory_gb = Some(1.0);
        let assessment = assessor(snap).assess().await;
        assert_eq!(assessment.overall, 80);
        assert_eq!(assessment.recommendation, Recommendation::Blocked);
        assert!(assessment.issues.iter().any(|i| i.contains("Virtual machine")));
    }

    #[tokio::test]
    async fn test_everything_fires_caps_at_hundred() {
        let mut snap = clean_snapshot();
        snap.user_agent = format!("{} kvm xen", CHROME_UA);
        snap.device_memory_gb = Some(0.5);
        snap.devices = Some(vec![]);
        snap.globals = vec!["chrome.runtime.id".into()];
        let assessment = assessor(snap).assess().await;
        assert_eq!(assessment.overall, 100);
        assert_eq!(assessment.categories.detection, 30);
    }

    #[tokio::test]
    async fn test_lockdown_browser_zeroes_browser_category() {
        let mut snap = clean_snapshot();
        snap.globals = vec!["LDB".into()];
        let assessment = assessor(snap).assess().await;
        assert_eq!(assessment.categories.browser, 0);
        assert_eq!(assessment.overall, 0);
    }

    #[tokio::test]
    async fn test_browser_risk_warnings() {
        let mut snap = clean_snapshot();
        snap.user_agent = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".into();
        snap.fullscreen = false;
        let a = assessor(snap);
        let info = a.identify_browser().await;
        let risk = a.assess_browser_risk(&info);
        assert_eq!(risk.score, 30 + 15 + 10);
        assert!(risk.warnings.contains(&"Firefox browser (less secure for exams)".to_string()));
    }
}
