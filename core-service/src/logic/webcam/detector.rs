//! Camera & face-detector seams
//!
//! Camera acquisition and the face model are external. The monitor only sees
//! these traits, so tests plug in scripted fakes.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{FaceDetection, VideoFrame, WebcamError};

/// A live camera stream
pub trait MediaStream: Send + Sync {
    /// Latest decoded frame, `None` before the first one arrives
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Stop every camera track of this stream
    fn stop_tracks(&self);
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, WebcamError>;
}

/// Black-box face classifier, one call per analysed frame
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn estimate_faces(&self, frame: &VideoFrame) -> Result<Vec<FaceDetection>, WebcamError>;
}

#[async_trait]
pub trait FaceModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn FaceDetector>, WebcamError>;
}

// ============================================================================
// STREAM OWNERSHIP
// ============================================================================

/// Stream plus who owns it.
///
/// `Owned` streams were acquired by the monitor and are stopped on release.
/// `Borrowed` streams (a warm stream handed in by the caller) are only detached.
#[derive(Clone)]
pub enum StreamHandle {
    Owned(Arc<dyn MediaStream>),
    Borrowed(Arc<dyn MediaStream>),
}

impl StreamHandle {
    pub fn stream(&self) -> &Arc<dyn MediaStream> {
        match self {
            StreamHandle::Owned(s) | StreamHandle::Borrowed(s) => s,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, StreamHandle::Owned(_))
    }

    pub fn release(self) {
        match self {
            StreamHandle::Owned(stream) => {
                stream.stop_tracks();
                log::debug!("[Webcam] Camera tracks stopped");
            }
            StreamHandle::Borrowed(_) => {
                log::debug!("[Webcam] Preserving borrowed stream; tracks left running");
            }
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamHandle::Owned(_) => write!(f, "StreamHandle::Owned"),
            StreamHandle::Borrowed(_) => write!(f, "StreamHandle::Borrowed"),
        }
    }
}
