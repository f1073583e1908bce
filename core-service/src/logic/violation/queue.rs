//! Violation Queue
//!
//! FIFO queue shared by every violation source. Flushing takes a bounded
//! batch off the front; whatever was not delivered goes back to the front,
//! in order, ready for the next attempt.

use std::collections::VecDeque;

use super::types::Violation;

#[derive(Debug, Default)]
pub struct ViolationQueue {
    items: VecDeque<Violation>,
}

impl ViolationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.items.push_back(violation);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove up to `max` violations from the front
    pub fn take_batch(&mut self, max: usize) -> Vec<Violation> {
        let n = max.min(self.items.len());
        self.items.drain(..n).collect()
    }

    /// Put an unsent remainder back at the front, preserving its order
    pub fn restore_front(&mut self, unsent: Vec<Violation>) {
        for violation in unsent.into_iter().rev() {
            self.items.push_front(violation);
        }
    }

    pub fn front(&self) -> Option<&Violation> {
        self.items.front()
    }

    pub fn snapshot(&self) -> Vec<Violation> {
        self.items.iter().cloned().collect()
    }
}
