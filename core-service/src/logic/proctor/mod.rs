//! Proctor Module - Session Orchestration
//!
//! Điều phối toàn bộ phiên thi: tạo session, kiểm tra môi trường,
//! khởi động webcam và network guard, gom và gửi violations.
//!
//! ## Structure
//! - `types`: config, session state, status/metrics, errors
//! - `host`: PageHost seam (visibility, fullscreen, window metrics)
//! - `checks`: per-tick session checks
//! - `risk`: running session risk score
//! - `coordinator`: ProctorCoordinator lifecycle + flush loop

pub mod types;
pub mod host;
pub mod checks;
pub mod risk;
pub mod coordinator;


pub use types::{
    ProctorConfig,
    ProctorError,
    ProctorMetrics,
    ProctorStatus,
    SessionRisk,
    SessionRiskLevel,
    SessionState,
    WebcamStatus,
};

pub use host::{PageHost, WindowMetrics};
pub use checks::{check_session, SessionFinding};
pub use risk::{session_risk, ViolationTally};
pub use coordinator::{ProctorCoordinator, ProctorDeps};
