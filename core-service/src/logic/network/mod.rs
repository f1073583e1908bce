//! Network Module - Request Interception & Policy
//!
//! Chặn mọi request ra ngoài trong lúc thi.
//! The guard owns an interceptor chain installed on the page's single
//! network entry point, plus opt-in page hardening (clipboard, storage).
//!
//! ## Structure
//! - `types`: NetworkRequest, Decision, PageEvent, errors
//! - `patterns`: suspicious URL regexes
//! - `history`: bounded request history
//! - `transport`: Transport seam, entry point, guarded middleware
//! - `guard`: NetworkGuard

pub mod types;
pub mod patterns;
pub mod history;
pub mod transport;
pub mod guard;

#[cfg(test)]
mod tests;

pub use types::{
    BlockReason,
    Decision,
    EventDisposition,
    GuardConfig,
    HttpRequest,
    HttpResponse,
    NetworkGuardError,
    NetworkRequest,
    PageEvent,
    StorageOp,
    DEFAULT_ALLOWED_DOMAINS,
    EXTERNAL_NAVIGATION_REASON,
    NAVIGATION_METHOD,
};

pub use history::{RequestHistory, MAX_HISTORY};
pub use patterns::match_suspicious;
pub use transport::{GuardedTransport, NetworkEntryPoint, ReqwestTransport, Transport, XhrRequest};
pub use guard::{NetworkGuard, NetworkListener, RequestInterceptor};
