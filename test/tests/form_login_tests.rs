//! Form login tests.
//!
//! Tests for the login, logout and saved request flow through the full app.


use actix_web::http::StatusCode;
use actix_web::test;

use common::{create_test_app, get, location, login, session_cookie, test_chain};
use session_guard_core::http::security::SecurityEventType;

#[actix_web::test]
async fn test_login_success_redirects_home() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let cookie = session_cookie(&resp).unwrap();
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));

    let success = events.get_events_by_type(&SecurityEventType::AuthenticationSuccess);
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].session_id.as_deref(), Some(cookie.value()));
}

#[actix_web::test]
async fn test_bad_credentials_redirect_to_error() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let wrong_password = login(&app, "user", "wrong", None).await;
    let unknown_user = login(&app, "nobody", "user", None).await;

    // Both failures look the same to the client
    for resp in [&wrong_password, &unknown_user] {
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(resp), "/loginForm?error");
        assert!(session_cookie(resp).is_none());
    }

    let failures = events.get_events_by_type(&SecurityEventType::AuthenticationFailure);
    assert_eq!(failures.len(), 2);
}

#[actix_web::test]
async fn test_login_page_shows_notices() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let body = test::read_body(get(&app, "/loginForm?error", None).await).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("Invalid username or password"));
    assert!(body.contains(r#"action="/login""#));

    let body = test::read_body(get(&app, "/loginForm?logout", None).await).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("You have been logged out"));
}

#[actix_web::test]
async fn test_saved_request_is_replayed() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = get(&app, "/manager?tab=reports", None).await;
    assert_eq!(location(&resp), "/loginForm");
    let pre_login = session_cookie(&resp).unwrap();

    let resp = login(&app, "manager", "manager", Some(&pre_login)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/manager?tab=reports");

    let session = session_cookie(&resp).unwrap();
    assert_ne!(session.value(), pre_login.value());

    let resp = get(&app, "/manager", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The pre-login id no longer names a session
    let resp = get(&app, "/manager", Some(&pre_login)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm");
}

#[actix_web::test]
async fn test_session_id_changes_on_login() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = get(&app, "/user", None).await;
    let pre_login = session_cookie(&resp).unwrap();
    let resp = login(&app, "user", "user", Some(&pre_login)).await;
    let session = session_cookie(&resp).unwrap();

    let changed = events.get_events_by_type(&SecurityEventType::SessionIdChanged);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].session_id.as_deref(), Some(session.value()));
}

#[actix_web::test]
async fn test_logout() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "admin", "admin", None).await;
    let session = session_cookie(&resp).unwrap();

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(session.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm?logout");

    let removal = session_cookie(&resp).unwrap();
    assert!(removal.value().is_empty());

    // Old cookie is anonymous now
    let resp = get(&app, "/admin", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm");

    assert_eq!(events.get_events_by_type(&SecurityEventType::Logout).len(), 1);
}
