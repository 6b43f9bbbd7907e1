//! Concurrent session control tests.
//!
//! The demo allows one session per user and refuses further logins.


use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;

use common::{create_test_app, get, location, login, session_cookie, test_chain, test_chain_with};
use session_guard_core::http::security::{
    InMemorySessionStore, SecurityEventType, SessionManagementConfig,
};

#[actix_web::test]
async fn test_second_login_is_refused() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    let first = session_cookie(&resp).unwrap();

    let resp = login(&app, "user", "user", None).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm?error");
    assert!(session_cookie(&resp).is_none());

    // First session is untouched
    let resp = get(&app, "/user", Some(&first)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let exceeded = events.get_events_by_type(&SecurityEventType::MaximumSessionsExceeded);
    assert_eq!(exceeded.len(), 1);
    assert_eq!(exceeded[0].username.as_deref(), Some("user"));
}

#[actix_web::test]
async fn test_cap_is_per_user() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let user = session_cookie(&login(&app, "user", "user", None).await).unwrap();
    let admin = session_cookie(&login(&app, "admin", "admin", None).await).unwrap();

    assert_eq!(get(&app, "/user", Some(&user)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/admin", Some(&admin)).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_login_allowed_after_logout() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let first = session_cookie(&login(&app, "user", "user", None).await).unwrap();

    let req = actix_web::test::TestRequest::post()
        .uri("/logout")
        .cookie(first)
        .to_request();
    actix_web::test::call_service(&app, req).await;

    let resp = login(&app, "user", "user", None).await;
    assert_eq!(location(&resp), "/");
    let second = session_cookie(&resp).unwrap();
    assert_eq!(get(&app, "/user", Some(&second)).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_eviction_expires_oldest_session() {
    let (chain, events) = test_chain_with(|security| {
        security.session_management(
            SessionManagementConfig::new()
                .maximum_sessions(1)
                .expired_url("/loginForm?expired"),
        )
    })
    .await;
    let app = create_test_app(chain).await;

    let first = session_cookie(&login(&app, "user", "user", None).await).unwrap();

    let resp = login(&app, "user", "user", None).await;
    assert_eq!(location(&resp), "/");
    let second = session_cookie(&resp).unwrap();

    // Evicted session is sent to the expired URL and its cookie removed
    let resp = get(&app, "/user", Some(&first)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm?expired");
    assert!(session_cookie(&resp).unwrap().value().is_empty());

    assert_eq!(get(&app, "/user", Some(&second)).await.status(), StatusCode::OK);

    let evicted = events.get_events_by_type(&SecurityEventType::SessionEvicted);
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].session_id.as_deref(), Some(first.value()));

    let expired = events.get_events_by_type(&SecurityEventType::SessionExpired);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].path.as_deref(), Some("/user"));

    // Once expired the id is gone for good
    let resp = get(&app, "/user", Some(&first)).await;
    assert_eq!(location(&resp), "/loginForm");
}

#[actix_web::test]
async fn test_timed_out_anonymous_sessions_are_reaped() {
    let store = InMemorySessionStore::new();
    let shared = store.clone();
    let (chain, _) = test_chain_with(move |security| {
        security.session_store(Arc::new(shared)).session_management(
            SessionManagementConfig::new()
                .timeout(Duration::from_secs(1))
                .cleanup_interval(Duration::ZERO),
        )
    })
    .await;
    let app = create_test_app(chain).await;

    for _ in 0..20 {
        get(&app, "/user", None).await;
    }
    assert_eq!(store.len().await, 20);

    actix_web::rt::time::sleep(Duration::from_millis(1200)).await;
    get(&app, "/user", None).await;
    assert_eq!(store.len().await, 1);
}
