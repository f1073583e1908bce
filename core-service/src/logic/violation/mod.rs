//! Violation Module
//!
//! Classified, severity-tagged records of suspected cheating, plus the two
//! pieces of machinery every source shares: a per-type cooldown and the
//! FIFO delivery queue.
//!
//! ## Structure
//! - `types`: ViolationType, Severity, Violation
//! - `throttle`: per-type cooldown window
//! - `queue`: FIFO queue with batch take / unsent-remainder restore

pub mod types;
pub mod throttle;
pub mod queue;

pub use types::{Severity, Violation, ViolationType};
pub use throttle::ViolationThrottle;
pub use queue::ViolationQueue;
