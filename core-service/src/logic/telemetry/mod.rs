//! Telemetry Module
//!
//! Bounded in-memory log of exam lifecycle events, exportable as JSONL for
//! post-exam review.
//!
//! ## Structure
//! - `event.rs` - TelemetryEvent (timestamped, typed)
//! - `recorder.rs` - bounded TelemetryLog + JSONL export

pub mod event;
pub mod recorder;

pub use event::{TelemetryEvent, TelemetryEventType};
pub use recorder::{default_export_dir, read_events, TelemetryLog, MAX_EVENTS};
