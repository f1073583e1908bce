//! Page host seam
//!
//! What the coordinator needs from the page it is proctoring.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetrics {
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
}

impl WindowMetrics {
    /// Docked dev tools shrink the inner window. Best-effort only:
    /// detached dev tools never trip this.
    pub fn suggests_dev_tools(&self, threshold_px: u32) -> bool {
        self.outer_height.saturating_sub(self.inner_height) > threshold_px
            || self.outer_width.saturating_sub(self.inner_width) > threshold_px
    }
}

pub trait PageHost: Send + Sync {
    /// URL of the exam page (same-origin reference for the network guard)
    fn current_url(&self) -> String;

    fn is_hidden(&self) -> bool;

    fn is_fullscreen(&self) -> bool;

    fn window_metrics(&self) -> WindowMetrics;

    fn set_copy_paste_enabled(&self, enabled: bool);

    fn set_text_selection_enabled(&self, enabled: bool);
}
