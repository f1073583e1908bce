//! Exam Proctor Core
//!
//! Proctoring security core for WAEC/JAMB mock exams: admission gate,
//! webcam face monitoring, network interception and a session coordinator
//! that ships violations to the exam-session backend.

pub mod constants;
pub mod logic;

pub use logic::config::{ExamType, ProctorThresholds};
pub use logic::proctor::{ProctorConfig, ProctorCoordinator, ProctorDeps};
pub use logic::violation::{Severity, Violation, ViolationType};
