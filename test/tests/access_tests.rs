//! URL rule tests.
//!
//! Tests for the demo's access rules as enforced by the security middleware.


use actix_web::http::StatusCode;
use actix_web::test;

use common::{create_test_app, get, location, login, session_cookie, test_chain};
use session_guard_core::http::security::SecurityEventType;

// =============================================================================
// Anonymous Access
// =============================================================================

#[actix_web::test]
async fn test_public_pages_without_login() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    for uri in ["/", "/public/info", "/loginForm"] {
        let resp = get(&app, uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }
}

#[actix_web::test]
async fn test_protected_pages_redirect_to_login() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    for uri in ["/user", "/manager", "/admin", "/admin/users"] {
        let resp = get(&app, uri, None).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), "/loginForm");
        // Pre-login session carrying the saved request
        assert!(session_cookie(&resp).is_some());
    }
}

#[actix_web::test]
async fn test_handler_checks_redirect_to_login() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    for uri in ["/info", "/data"] {
        let resp = get(&app, uri, None).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), "/loginForm");
    }

    // The request is saved like any other protected page
    let resp = get(&app, "/info", None).await;
    let pre_login = session_cookie(&resp).unwrap();
    let resp = login(&app, "admin", "admin", Some(&pre_login)).await;
    assert_eq!(location(&resp), "/info");

    let session = session_cookie(&resp).unwrap();
    let body = test::read_body(get(&app, "/info", Some(&session)).await).await;
    assert_eq!(body, "personal info");
}

// =============================================================================
// Role Matrix
// =============================================================================

#[actix_web::test]
async fn test_user_role() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    let session = session_cookie(&resp).unwrap();

    let resp = get(&app, "/user", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "user: user");

    for uri in ["/manager", "/admin", "/info", "/data"] {
        let resp = get(&app, uri, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[actix_web::test]
async fn test_manager_role() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "manager", "manager", None).await;
    let session = session_cookie(&resp).unwrap();

    for uri in ["/user", "/manager", "/data"] {
        let resp = get(&app, uri, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }
    for uri in ["/admin", "/info"] {
        let resp = get(&app, uri, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[actix_web::test]
async fn test_admin_role() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "admin", "admin", None).await;
    let session = session_cookie(&resp).unwrap();

    for uri in ["/user", "/manager", "/admin", "/info", "/data", "/"] {
        let resp = get(&app, uri, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }

    let body = test::read_body(get(&app, "/", Some(&session)).await).await;
    assert_eq!(body, "index: admin");
}

#[actix_web::test]
async fn test_access_denied_is_published() {
    let (chain, events) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    let session = session_cookie(&resp).unwrap();
    get(&app, "/admin", Some(&session)).await;

    let denied = events.get_events_by_type(&SecurityEventType::AccessDenied);
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].username.as_deref(), Some("user"));
    assert_eq!(denied[0].path.as_deref(), Some("/admin"));
}

#[actix_web::test]
async fn test_unknown_session_cookie_is_anonymous() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let forged = actix_web::cookie::Cookie::new(common::SESSION_COOKIE, "not-a-session");
    let resp = get(&app, "/user", Some(&forged)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/loginForm");

    let resp = get(&app, "/public/info", Some(&forged)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Request Paths
// =============================================================================

#[actix_web::test]
async fn test_encoded_path_follows_rules() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    let session = session_cookie(&resp).unwrap();

    // Routed as /admin, so authorized as /admin
    let resp = get(&app, "/%61dmin", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = get(&app, "/%61dmin/", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_encoded_path_allowed_for_admin() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "admin", "admin", None).await;
    let session = session_cookie(&resp).unwrap();

    let resp = get(&app, "/%61dmin", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "admin: admin");
}

#[actix_web::test]
async fn test_ambiguous_paths_are_rejected() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = login(&app, "user", "user", None).await;
    let session = session_cookie(&resp).unwrap();

    for uri in ["/%2561dmin", "//admin", "/user/../admin", "/admin%2Fusers", "/admin;x=1"] {
        let resp = get(&app, uri, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let resp = get(&app, uri, None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(session_cookie(&resp).is_none(), "{}", uri);
    }
}

#[actix_web::test]
async fn test_saved_request_uses_routed_path() {
    let (chain, _) = test_chain().await;
    let app = create_test_app(chain).await;

    let resp = get(&app, "/%61dmin", None).await;
    assert_eq!(location(&resp), "/loginForm");
    let pre_login = session_cookie(&resp).unwrap();

    let resp = login(&app, "admin", "admin", Some(&pre_login)).await;
    assert_eq!(location(&resp), "/admin");
}
