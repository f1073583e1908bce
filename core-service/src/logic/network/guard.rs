//! Network Guard - request policy & interception
//!
//! Evaluation order for every fetch/XHR request (first rejection wins):
//! 1. record into history
//! 2. custom interceptors, in registration order
//! 3. suspicious URL patterns
//! 4. same-origin / localhost
//! 5. allow-list (exact or `*.` wildcard)
//! 6. deny
//!
//! Unparseable URLs are denied.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::Url;

use super::history::RequestHistory;
use super::patterns::match_suspicious;
use super::transport::{GuardedTransport, NetworkEntryPoint, Transport, XhrRequest};
use super::types::*;

/// Extra async predicate; returning false rejects the request
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn allow(&self, request: &NetworkRequest) -> bool;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(&NetworkRequest) -> bool + Send + Sync,
{
    async fn allow(&self, request: &NetworkRequest) -> bool {
        self(request)
    }
}

/// Receives every blocked request or navigation
#[async_trait]
pub trait NetworkListener: Send + Sync {
    async fn on_suspicious_request(&self, request: NetworkRequest);
}

// ============================================================================
// POLICY CORE
// ============================================================================

pub(crate) struct GuardCore {
    page_url: Url,
    block_all_external: bool,
    allowed_domains: RwLock<HashSet<String>>,
    interceptors: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
    history: Mutex<RequestHistory>,
    listener: Arc<dyn NetworkListener>,
}

impl GuardCore {
    fn page_host(&self) -> &str {
        self.page_url.host_str().unwrap_or_default()
    }

    fn is_allowed_domain(&self, domain: &str) -> bool {
        let allowed = self.allowed_domains.read();
        if allowed.contains(domain) {
            return true;
        }

        allowed.iter().filter_map(|d| d.strip_prefix("*.")).any(|base| {
            domain == base
                || domain
                    .strip_suffix(base)
                    .map_or(false, |head| head.ends_with('.'))
        })
    }

    async fn evaluate(&self, method: &str, url: &str) -> Decision {
        let id = self.history.lock().record(method, url);
        let decision = self.decide(id, method, url).await;

        if let Decision::Block(reason) = decision {
            self.history.lock().mark_blocked(id, reason);
        }
        decision
    }

    async fn decide(&self, id: u64, method: &str, url: &str) -> Decision {
        let interceptors: Vec<_> = self.interceptors.read().iter().cloned().collect();
        if !interceptors.is_empty() {
            let mut request = NetworkRequest::new(method, url);
            request.id = id;
            for interceptor in interceptors {
                if !interceptor.allow(&request).await {
                    log::warn!("[NetworkGuard] Request rejected by interceptor: {}", url);
                    return Decision::Block(BlockReason::Interceptor);
                }
            }
        }

        if let Some(category) = match_suspicious(url) {
            log::warn!("[NetworkGuard] Suspicious URL pattern detected ({}): {}", category, url);
            return Decision::Block(BlockReason::SuspiciousPattern);
        }

        let parsed = match Url::options().base_url(Some(&self.page_url)).parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("[NetworkGuard] Could not parse URL {}: {}", url, e);
                return Decision::Block(BlockReason::MalformedUrl);
            }
        };
        let host = parsed.host_str().unwrap_or_default();

        if host == self.page_host() || host == "localhost" || host == "127.0.0.1" {
            return Decision::Allow;
        }

        if self.is_allowed_domain(host) {
            return Decision::Allow;
        }

        // Unknown domains are denied whatever the flag says
        if self.block_all_external {
            log::warn!("[NetworkGuard] External request blocked: {}", host);
            Decision::Block(BlockReason::ExternalBlocked)
        } else {
            log::warn!("[NetworkGuard] Unknown external domain blocked: {}", host);
            Decision::Block(BlockReason::UnknownDomain)
        }
    }

    /// Evaluate, and report to the listener when rejected. True if allowed.
    pub(crate) async fn check_and_report(&self, method: &str, url: &str) -> bool {
        match self.evaluate(method, url).await {
            Decision::Allow => true,
            Decision::Block(reason) => {
                let mut request = NetworkRequest::new(method, url);
                request.blocked = true;
                request.reason = Some(reason.as_str().to_string());
                self.listener.on_suspicious_request(request).await;
                false
            }
        }
    }
}

// ============================================================================
// GUARD
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct Hardening {
    clipboard: bool,
    storage: bool,
}

pub struct NetworkGuard {
    core: Arc<GuardCore>,
    entry: Arc<NetworkEntryPoint>,
    original: Mutex<Option<Arc<dyn Transport>>>,
    running: AtomicBool,
    hardening: Mutex<Hardening>,
}

impl NetworkGuard {
    pub fn new(
        config: GuardConfig,
        entry: Arc<NetworkEntryPoint>,
        listener: Arc<dyn NetworkListener>,
    ) -> Result<Self, NetworkGuardError> {
        let page_url = Url::parse(&config.page_url)
            .map_err(|e| NetworkGuardError::InvalidPageUrl(format!("{}: {}", config.page_url, e)))?;

        let mut allowed: HashSet<String> = DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect();
        if let Some(host) = page_url.host_str() {
            allowed.insert(host.to_string());
        }
        allowed.extend(config.allowed_domains);

        Ok(Self {
            core: Arc::new(GuardCore {
                page_url,
                block_all_external: config.block_all_external,
                allowed_domains: RwLock::new(allowed),
                interceptors: RwLock::new(Vec::new()),
                history: Mutex::new(RequestHistory::default()),
                listener,
            }),
            entry,
            original: Mutex::new(None),
            running: AtomicBool::new(false),
            hardening: Mutex::new(Hardening::default()),
        })
    }

    /// Install the guarded transport on the entry point
    pub fn start(&self) -> Result<(), NetworkGuardError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(NetworkGuardError::AlreadyStarted);
        }

        let current = self.entry.current();
        let guarded = Arc::new(GuardedTransport::new(Arc::clone(&current), Arc::clone(&self.core)));
        self.entry.install(guarded);
        *self.original.lock() = Some(current);

        log::info!("[NetworkGuard] Monitoring started");
        Ok(())
    }

    /// Restore the original transport. Safe to call repeatedly.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(original) = self.original.lock().take() {
            self.entry.install(original);
        }
        log::info!("[NetworkGuard] Monitoring stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the full evaluation without reporting
    pub async fn evaluate_request(&self, method: &str, url: &str) -> Decision {
        self.core.evaluate(method, url).await
    }

    /// XHR `open`: the request is aborted when policy rejects it
    pub async fn on_xhr_open(&self, method: &str, url: &str, xhr: &dyn XhrRequest) -> bool {
        if !self.is_running() {
            return true;
        }
        let allowed = self.core.check_and_report(method, url).await;
        if !allowed {
            xhr.abort();
        }
        allowed
    }

    pub fn add_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.core.interceptors.write().push(interceptor);
    }

    pub fn add_allowed_domain(&self, domain: impl Into<String>) {
        self.core.allowed_domains.write().insert(domain.into());
    }

    pub fn is_allowed_domain(&self, domain: &str) -> bool {
        self.core.is_allowed_domain(domain)
    }

    pub fn request_history(&self) -> Vec<NetworkRequest> {
        self.core.history.lock().entries()
    }

    pub fn suspicious_requests(&self) -> Vec<NetworkRequest> {
        self.core.history.lock().suspicious()
    }

    pub fn clear_history(&self) {
        self.core.history.lock().clear();
    }

    // ========================================================================
    // HARDENING
    // ========================================================================

    /// Suppress copy/cut/paste and drag-and-drop
    pub fn disable_clipboard(&self) {
        self.hardening.lock().clipboard = true;
    }

    /// Make localStorage writes throw
    pub fn disable_storage_access(&self) {
        self.hardening.lock().storage = true;
    }

    /// Decide what the host does with a page event
    pub async fn handle_event(&self, event: &PageEvent) -> EventDisposition {
        let hardening = *self.hardening.lock();

        match event {
            PageEvent::Copy | PageEvent::Cut | PageEvent::Paste if hardening.clipboard => {
                log::warn!("[NetworkGuard] {:?} disabled during exam", event);
                EventDisposition::PreventDefault
            }
            PageEvent::DragOver if hardening.clipboard => EventDisposition::PreventDefault,
            PageEvent::Drop if hardening.clipboard => {
                log::warn!("[NetworkGuard] Drag and drop disabled during exam");
                EventDisposition::PreventDefault
            }
            PageEvent::StorageWrite { op, key } if hardening.storage => {
                log::warn!("[NetworkGuard] localStorage.{} blocked during exam: {}", op.as_str(), key);
                EventDisposition::Raise(NetworkGuardError::StorageDenied {
                    op: op.as_str(),
                    key: key.clone(),
                })
            }
            PageEvent::BeforeUnload if self.is_running() => EventDisposition::ConfirmUnload,
            PageEvent::PopState if self.is_running() => {
                EventDisposition::RepushUrl(self.core.page_url.to_string())
            }
            PageEvent::WindowOpen { url } if self.is_running() => {
                log::warn!("[NetworkGuard] window.open() blocked during exam: {}", url);
                EventDisposition::Suppressed
            }
            PageEvent::LinkClick { href } if self.is_running() => self.on_link_click(href).await,
            _ => EventDisposition::Allow,
        }
    }

    /// Link clicks only go through the domain policy
    async fn on_link_click(&self, href: &str) -> EventDisposition {
        let target_host = Url::options()
            .base_url(Some(&self.core.page_url))
            .parse(href)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        let allowed = match &target_host {
            Some(host) => host == self.core.page_host() || self.core.is_allowed_domain(host),
            None => false,
        };
        if allowed {
            return EventDisposition::Allow;
        }

        log::warn!("[NetworkGuard] Navigation blocked to {}", href);
        let request = {
            let mut history = self.core.history.lock();
            let id = history.record(NAVIGATION_METHOD, href);
            history.mark_blocked(id, BlockReason::ExternalNavigation)
        };
        if let Some(request) = request {
            self.core.listener.on_suspicious_request(request).await;
        }

        EventDisposition::PreventDefault
    }
}

impl Drop for NetworkGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
