//! Per-type violation cooldown

use std::collections::HashMap;

use super::types::ViolationType;

/// Suppresses repeats of the same violation type inside a cooldown window.
///
/// The window is measured from the previous *firing* of that exact type;
/// suppressed attempts do not extend it.
#[derive(Debug, Clone)]
pub struct ViolationThrottle {
    cooldown_ms: u64,
    last_fired: HashMap<ViolationType, u64>,
}

impl ViolationThrottle {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_fired: HashMap::new(),
        }
    }

    /// Returns true (and records the firing) if `kind` may fire at `now_ms`
    pub fn try_fire(&mut self, kind: ViolationType, now_ms: u64) -> bool {
        if let Some(&last) = self.last_fired.get(&kind) {
            if now_ms.saturating_sub(last) < self.cooldown_ms {
                return false;
            }
        }
        self.last_fired.insert(kind, now_ms);
        true
    }

    pub fn last_fired(&self, kind: ViolationType) -> Option<u64> {
        self.last_fired.get(&kind).copied()
    }

    pub fn reset(&mut self) {
        self.last_fired.clear();
    }
}
