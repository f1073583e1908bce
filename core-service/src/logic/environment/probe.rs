//! Environment Probe
//!
//! The read-only view of the browser/runtime the assessor works from.
//! Hosts implement `EnvironmentProbe`; `EnvironmentSnapshot` is a
//! serialisable probe for recorded environments and preflight checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{MediaDeviceInfo, ScreenMetrics};

#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("device enumeration unsupported")]
    Unsupported,
    #[error("device enumeration failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    fn user_agent(&self) -> String;

    /// Whether a named global/window property is present (e.g. `respondusLDB`)
    fn has_global(&self, name: &str) -> bool;

    fn screen(&self) -> ScreenMetrics;

    /// Reported device memory in GB, if the platform exposes it
    fn device_memory_gb(&self) -> Option<f64>;

    fn is_fullscreen_capable(&self) -> bool;

    fn is_fullscreen(&self) -> bool;

    fn can_disable_copy_paste(&self) -> bool;

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ProbeError>;
}

/// A recorded environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    pub globals: Vec<String>,
    pub screen: ScreenMetrics,
    pub device_memory_gb: Option<f64>,
    pub fullscreen_capable: bool,
    pub fullscreen: bool,
    pub copy_paste_disable: bool,
    /// `None` means enumeration is unavailable on this platform
    pub devices: Option<Vec<MediaDeviceInfo>>,
}

#[async_trait]
impl EnvironmentProbe for EnvironmentSnapshot {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn has_global(&self, name: &str) -> bool {
        self.globals.iter().any(|g| g == name)
    }

    fn screen(&self) -> ScreenMetrics {
        self.screen
    }

    fn device_memory_gb(&self) -> Option<f64> {
        self.device_memory_gb
    }

    fn is_fullscreen_capable(&self) -> bool {
        self.fullscreen_capable
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn can_disable_copy_paste(&self) -> bool {
        self.copy_paste_disable
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ProbeError> {
        self.devices.clone().ok_or(ProbeError::Unsupported)
    }
}
