//! Environment Types
//!
//! Browser identity and admission risk data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// PLATFORM FACTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMetrics {
    pub avail_width: u32,
    pub avail_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub kind: MediaDeviceKind,
    #[serde(default)]
    pub label: String,
}

// ============================================================================
// BROWSER INFO
// ============================================================================

/// Browser identity and capabilities, also sent on session create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    pub name: String,
    pub version: String,
    pub user_agent: String,
    pub is_lockdown_browser: bool,
    pub is_respondus_monitor: bool,
    pub is_fullscreen_capable: bool,
    pub is_fullscreen_mode: bool,
    pub can_access_camera: bool,
    pub can_access_microphone: bool,
    pub can_disable_copy_paste: bool,
}

impl BrowserInfo {
    /// Running inside a lockdown browser or under a recognised proctoring monitor
    pub fn is_secured(&self) -> bool {
        self.is_lockdown_browser || self.is_respondus_monitor
    }
}

// ============================================================================
// RISK ASSESSMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Safe,
    Caution,
    Blocked,
}

impl Recommendation {
    /// Step function over the 0-100 range: >70 blocked, >40 caution
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            Recommendation::Blocked
        } else if score > 40 {
            Recommendation::Caution
        } else {
            Recommendation::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Safe => "safe",
            Recommendation::Caution => "caution",
            Recommendation::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub browser: u8,
    pub environment: u8,
    pub permissions: u8,
    pub detection: u8,
}

impl CategoryScores {
    pub fn total(&self) -> u8 {
        let sum = self.browser as u16
            + self.environment as u16
            + self.permissions as u16
            + self.detection as u16;
        sum.min(100) as u8
    }
}

/// Computed once at admission time; never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: u8,
    pub categories: CategoryScores,
    pub issues: Vec<String>,
    pub recommendation: Recommendation,
}

/// Browser-only sub-score with human readable warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserRisk {
    pub score: u8,
    pub warnings: Vec<String>,
}
