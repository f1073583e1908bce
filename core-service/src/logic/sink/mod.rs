//! Sink Module - Exam-session Backend
//!
//! REST sink for session create / heartbeat / violation / end.
//! The coordinator only sees the `SessionSink` trait.

pub mod types;
pub mod client;

pub use client::{HttpSessionSink, SessionSink, SinkConfig};
pub use types::{
    CreateSessionRequest,
    CreateSessionResponse,
    EndSessionRequest,
    HeartbeatRequest,
    SinkError,
};
