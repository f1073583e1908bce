//! Logic Module - Proctoring Engines
//!
//! Chứa các engines giám sát phiên thi: Environment, Webcam, Network, Proctor.
//!
//! ## Architecture
//! - `config` - exam thresholds (defaults + env overrides)
//! - `violation/` - violation model, throttle, delivery queue
//! - `environment/` - admission gate (browser identity, VM heuristics)
//! - `webcam/` - face presence monitor
//! - `network/` - request interception and page hardening
//! - `sink/` - exam-session backend client
//! - `proctor/` - session coordinator
//! - `telemetry/` - lifecycle event log

pub mod config;
pub mod violation;
pub mod environment;
pub mod webcam;
pub mod network;
pub mod sink;
pub mod proctor;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
