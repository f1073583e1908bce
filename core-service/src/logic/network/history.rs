//! Bounded request history (FIFO ring buffer)

use std::collections::VecDeque;

use chrono::Utc;

use super::types::{BlockReason, NetworkRequest};

pub const MAX_HISTORY: usize = 1000;

#[derive(Debug)]
pub struct RequestHistory {
    entries: VecDeque<NetworkRequest>,
    capacity: usize,
    next_id: u64,
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }
}

impl RequestHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            next_id: 1,
        }
    }

    /// Append a request, evicting the oldest beyond capacity. Returns its id.
    pub fn record(&mut self, method: &str, url: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_back(NetworkRequest {
            id,
            method: method.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            blocked: false,
            reason: None,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        id
    }

    /// Flag an entry as blocked. Returns the updated copy if it is still held.
    pub fn mark_blocked(&mut self, id: u64, reason: BlockReason) -> Option<NetworkRequest> {
        let entry = self.entries.iter_mut().rev().find(|e| e.id == id)?;
        entry.blocked = true;
        entry.reason = Some(reason.as_str().to_string());
        Some(entry.clone())
    }

    pub fn entries(&self) -> Vec<NetworkRequest> {
        self.entries.iter().cloned().collect()
    }

    pub fn suspicious(&self) -> Vec<NetworkRequest> {
        self.entries.iter().filter(|e| e.blocked).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
