//! Environment Module - Admission Gate
//!
//! Đánh giá môi trường trình duyệt trước khi bắt đầu giám sát.
//! Browser identity, VM heuristics and device permissions become a single
//! `RiskAssessment`; `blocked` keeps monitoring from ever starting.
//!
//! ## Structure
//! - `types`: BrowserInfo, RiskAssessment, Recommendation
//! - `probe`: EnvironmentProbe seam + serialisable snapshot
//! - `browser`: UA parsing and lockdown/monitor markers
//! - `assessor`: scoring logic

pub mod types;
pub mod probe;
pub mod browser;
pub mod assessor;

pub use types::{
    BrowserInfo,
    BrowserRisk,
    CategoryScores,
    MediaDeviceInfo,
    MediaDeviceKind,
    Recommendation,
    RiskAssessment,
    ScreenMetrics,
};

pub use probe::{EnvironmentProbe, EnvironmentSnapshot, ProbeError};

pub use assessor::EnvironmentAssessor;
