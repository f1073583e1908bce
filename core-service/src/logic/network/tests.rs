//! Network guard scenarios

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::logic::testing::{FakeTransport, FakeXhr, RecordingNetworkListener};

const PAGE: &str = "http://localhost:3000/mock/123";

struct Rig {
    guard: NetworkGuard,
    entry: Arc<NetworkEntryPoint>,
    transport: Arc<FakeTransport>,
    listener: Arc<RecordingNetworkListener>,
}

fn rig_with(config: GuardConfig) -> Rig {
    let transport = Arc::new(FakeTransport::default());
    let entry = Arc::new(NetworkEntryPoint::new(transport.clone()));
    let listener = Arc::new(RecordingNetworkListener::default());
    let guard = NetworkGuard::new(config, entry.clone(), listener.clone()).unwrap();
    guard.start().unwrap();
    Rig { guard, entry, transport, listener }
}

fn rig() -> Rig {
    rig_with(GuardConfig::new(PAGE))
}

#[tokio::test]
async fn test_chegg_fetch_is_rejected_and_reported() {
    let r = rig();

    let err = r
        .entry
        .fetch(HttpRequest::get("https://chegg.com/anything"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        NetworkGuardError::Blocked {
            url: "https://chegg.com/anything".into()
        }
    );
    assert_eq!(r.transport.calls(), 0);

    let reported = r.listener.requests();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].url, "https://chegg.com/anything");
    assert!(reported[0].blocked);

    let suspicious = r.guard.suspicious_requests();
    assert_eq!(suspicious.len(), 1);
    assert_eq!(suspicious[0].reason.as_deref(), Some("Suspicious URL pattern"));
}

#[tokio::test]
async fn test_same_origin_allowed_regardless_of_flags() {
    for block_all in [true, false] {
        let mut config = GuardConfig::new(PAGE);
        config.block_all_external = block_all;
        let r = rig_with(config);

        for url in [
            "http://localhost:3000/api/questions",
            "/api/questions/7",
            "http://127.0.0.1:5000/api/health",
        ] {
            assert_eq!(r.guard.evaluate_request("GET", url).await, Decision::Allow, "{}", url);
        }
    }
}

#[tokio::test]
async fn test_allowed_fetch_reaches_transport() {
    let r = rig();
    let response = r
        .entry
        .fetch(HttpRequest::get("https://fonts.googleapis.com/css2?family=Inter"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(r.transport.calls(), 1);
    assert!(r.listener.requests().is_empty());
}

#[tokio::test]
async fn test_pattern_check_precedes_allow_list() {
    let r = rig();
    assert!(r.guard.is_allowed_domain("cdn.jsdelivr.net"));

    let decision = r
        .guard
        .evaluate_request("GET", "https://cdn.jsdelivr.net/npm/quiz-helper.js")
        .await;
    assert_eq!(decision, Decision::Block(BlockReason::SuspiciousPattern));
}

#[tokio::test]
async fn test_unknown_domain_denied_under_both_flags() {
    let strict = rig();
    assert_eq!(
        strict.guard.evaluate_request("GET", "https://unknown-site.io/data").await,
        Decision::Block(BlockReason::ExternalBlocked)
    );

    let mut config = GuardConfig::new(PAGE);
    config.block_all_external = false;
    let lenient = rig_with(config);
    assert_eq!(
        lenient.guard.evaluate_request("GET", "https://unknown-site.io/data").await,
        Decision::Block(BlockReason::UnknownDomain)
    );
}

#[tokio::test]
async fn test_wildcard_allow_list() {
    let r = rig();
    r.guard.add_allowed_domain("*.cloudfront.net");

    assert!(r.guard.is_allowed_domain("d1.cloudfront.net"));
    assert!(r.guard.is_allowed_domain("cloudfront.net"));
    assert!(!r.guard.is_allowed_domain("evilcloudfront.net"));
    assert_eq!(
        r.guard.evaluate_request("GET", "https://d1.cloudfront.net/app.js").await,
        Decision::Allow
    );
}

#[tokio::test]
async fn test_malformed_url_fails_closed() {
    let r = rig();
    assert_eq!(
        r.guard.evaluate_request("GET", "http://[::1").await,
        Decision::Block(BlockReason::MalformedUrl)
    );
}

#[tokio::test]
async fn test_interceptors_run_in_order_and_short_circuit() {
    let r = rig();
    let second_calls = Arc::new(AtomicUsize::new(0));

    r.guard
        .add_interceptor(Arc::new(|req: &NetworkRequest| !req.url.contains("/private")));
    let counter = second_calls.clone();
    r.guard.add_interceptor(Arc::new(move |_: &NetworkRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    }));

    assert_eq!(
        r.guard.evaluate_request("GET", "/private/data").await,
        Decision::Block(BlockReason::Interceptor)
    );
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);

    assert_eq!(r.guard.evaluate_request("GET", "/public/data").await, Decision::Allow);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_request_is_recorded() {
    let r = rig();
    r.guard.evaluate_request("GET", "/a").await;
    r.guard.evaluate_request("POST", "https://chegg.com").await;

    let history = r.guard.request_history();
    assert_eq!(history.len(), 2);
    assert!(!history[0].blocked);
    assert!(history[1].blocked);

    r.guard.clear_history();
    assert!(r.guard.request_history().is_empty());
}

#[tokio::test]
async fn test_history_caps_through_guard() {
    let r = rig();
    for i in 0..1005 {
        r.guard.evaluate_request("GET", &format!("/api/item/{}", i)).await;
    }
    let history = r.guard.request_history();
    assert_eq!(history.len(), MAX_HISTORY);
    assert_eq!(history[0].url, "/api/item/5");
}

#[tokio::test]
async fn test_rejected_xhr_is_aborted() {
    let r = rig();

    let xhr = FakeXhr::default();
    assert!(!r.guard.on_xhr_open("GET", "https://brainly.com/q", &xhr).await);
    assert!(xhr.is_aborted());
    assert_eq!(r.listener.requests().len(), 1);

    let xhr = FakeXhr::default();
    assert!(r.guard.on_xhr_open("GET", "/api/questions", &xhr).await);
    assert!(!xhr.is_aborted());
}

#[tokio::test]
async fn test_stop_restores_original_transport() {
    let r = rig();
    r.guard.stop();
    r.guard.stop();
    assert!(!r.guard.is_running());

    // Unguarded again: the fake transport answers directly
    let response = r.entry.fetch(HttpRequest::get("https://chegg.com/anything")).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(r.listener.requests().is_empty());
}

#[tokio::test]
async fn test_double_start_rejected() {
    let r = rig();
    assert_eq!(r.guard.start(), Err(NetworkGuardError::AlreadyStarted));
}

#[tokio::test]
async fn test_window_open_suppressed() {
    let r = rig();
    let d = r
        .guard
        .handle_event(&PageEvent::WindowOpen { url: "https://google.com".into() })
        .await;
    assert_eq!(d, EventDisposition::Suppressed);
}

#[tokio::test]
async fn test_external_link_click_prevented_and_reported() {
    let r = rig();

    let d = r
        .guard
        .handle_event(&PageEvent::LinkClick { href: "https://wikipedia.org/wiki/Rust".into() })
        .await;
    assert_eq!(d, EventDisposition::PreventDefault);

    let reported = r.listener.requests();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].method, NAVIGATION_METHOD);
    assert_eq!(reported[0].reason.as_deref(), Some(EXTERNAL_NAVIGATION_REASON));
    assert!(reported[0].blocked);

    // Blocked navigation lands in the audit history too
    let suspicious = r.guard.suspicious_requests();
    assert_eq!(suspicious.len(), 1);
    assert_eq!(suspicious[0].url, "https://wikipedia.org/wiki/Rust");
    assert_eq!(
        suspicious[0].reason.as_deref(),
        Some(BlockReason::ExternalNavigation.as_str())
    );

    let d = r
        .guard
        .handle_event(&PageEvent::LinkClick { href: "/mock/123/review".into() })
        .await;
    assert_eq!(d, EventDisposition::Allow);
}

#[tokio::test]
async fn test_navigation_hardening_while_running() {
    let r = rig();
    assert_eq!(r.guard.handle_event(&PageEvent::BeforeUnload).await, EventDisposition::ConfirmUnload);
    assert_eq!(
        r.guard.handle_event(&PageEvent::PopState).await,
        EventDisposition::RepushUrl(PAGE.to_string())
    );

    r.guard.stop();
    assert_eq!(r.guard.handle_event(&PageEvent::PopState).await, EventDisposition::Allow);
}

#[tokio::test]
async fn test_clipboard_and_storage_are_opt_in() {
    let r = rig();
    let write = PageEvent::StorageWrite {
        op: StorageOp::SetItem,
        key: "answers".into(),
    };

    assert_eq!(r.guard.handle_event(&PageEvent::Paste).await, EventDisposition::Allow);
    assert_eq!(r.guard.handle_event(&write).await, EventDisposition::Allow);

    r.guard.disable_clipboard();
    r.guard.disable_storage_access();

    assert_eq!(r.guard.handle_event(&PageEvent::Paste).await, EventDisposition::PreventDefault);
    assert_eq!(r.guard.handle_event(&PageEvent::Drop).await, EventDisposition::PreventDefault);
    assert!(matches!(
        r.guard.handle_event(&write).await,
        EventDisposition::Raise(NetworkGuardError::StorageDenied { op: "setItem", .. })
    ));
}
