//! Session risk scoring
//!
//! Running score over everything recorded so far in a session.

use std::collections::HashMap;

use crate::logic::config::ProctorThresholds;
use crate::logic::violation::{Violation, ViolationType};

use super::types::{SessionRisk, SessionRiskLevel};

// (points per event, cap)
const FACE_INTERRUPTION: (u32, u32) = (15, 40);
const SUSPICIOUS_NETWORK: (u32, u32) = (20, 35);
const DEVELOPER_TOOLS: (u32, u32) = (25, 50);
const ANY_VIOLATION: (u32, u32) = (5, 20);
const UNSECURED_BROWSER: u32 = 30;

/// More violations than this flags the session
const FLAG_VIOLATION_COUNT: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct ViolationTally {
    pub total: u32,
    pub critical: u32,
    pub by_type: HashMap<ViolationType, u32>,
}

impl ViolationTally {
    pub fn add(&mut self, violation: &Violation) {
        self.total += 1;
        if violation.severity.is_critical() {
            self.critical += 1;
        }
        *self.by_type.entry(violation.kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ViolationType) -> u32 {
        self.by_type.get(&kind).copied().unwrap_or(0)
    }

    fn face_interruptions(&self) -> u32 {
        self.by_type
            .iter()
            .filter(|(kind, _)| kind.is_webcam())
            .map(|(_, n)| *n)
            .sum()
    }
}

fn weighted(count: u32, (points, cap): (u32, u32)) -> u32 {
    count.saturating_mul(points).min(cap)
}

pub fn session_risk(tally: &ViolationTally, browser_secured: bool, thresholds: &ProctorThresholds) -> SessionRisk {
    let mut score = weighted(tally.face_interruptions(), FACE_INTERRUPTION)
        + weighted(tally.count(ViolationType::SuspiciousNetwork), SUSPICIOUS_NETWORK)
        + weighted(tally.count(ViolationType::DeveloperTools), DEVELOPER_TOOLS)
        + weighted(tally.total, ANY_VIOLATION);
    if !browser_secured {
        score += UNSECURED_BROWSER;
    }
    let score = score.min(100) as u8;

    let level = if tally.critical > 0
        || tally.total > FLAG_VIOLATION_COUNT
        || score >= thresholds.risk_score_block_threshold
    {
        SessionRiskLevel::Flagged
    } else if score >= thresholds.risk_score_warning_threshold {
        SessionRiskLevel::Warning
    } else {
        SessionRiskLevel::Normal
    };

    SessionRisk { score, level }
}
