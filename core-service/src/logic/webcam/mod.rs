//! Webcam Module - Face Presence Monitoring
//!
//! Giám sát khuôn mặt qua webcam trong suốt phiên thi.
//! Camera and face model sit behind traits; the monitor owns the loop,
//! the hysteresis counter and the per-type throttle.
//!
//! ## Structure
//! - `types`: frames, detections, heartbeats, errors
//! - `detector`: CameraDevice / FaceDetector seams + StreamHandle ownership
//! - `monitor`: WebcamMonitor state machine and analysis loop

pub mod types;
pub mod detector;
pub mod monitor;

pub use types::{
    FaceBounds,
    FaceDetection,
    FaceDetectionResult,
    VideoFrame,
    WebcamData,
    WebcamError,
    WebcamHeartbeat,
    WebcamState,
    WebcamStats,
    WebcamViolation,
    DEFAULT_FACE_CONFIDENCE,
};

pub use detector::{CameraDevice, FaceDetector, FaceModelLoader, MediaStream, StreamHandle};

pub use monitor::{WebcamListener, WebcamMonitor};
