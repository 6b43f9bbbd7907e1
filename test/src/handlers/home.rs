//! Pages guarded by the URL rules.

use actix_web::{get, HttpResponse, Responder};

use session_guard_core::http::security::{AuthenticatedUser, OptionalUser};

/// Public home page.
#[get("/")]
pub async fn index(current: OptionalUser) -> impl Responder {
    match current.into_inner() {
        Some(principal) => HttpResponse::Ok().body(format!("index: {}", principal.get_username())),
        None => HttpResponse::Ok().body("index"),
    }
}

/// No rule names this path, so it is open to everyone.
#[get("/public/info")]
pub async fn public_info() -> impl Responder {
    HttpResponse::Ok().body("public info")
}

/// `/user/**` - any authenticated user.
#[get("/user")]
pub async fn user(principal: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().body(format!("user: {}", principal.get_username()))
}

/// `/manager/**` - ADMIN or MANAGER.
#[get("/manager")]
pub async fn manager(principal: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().body(format!("manager: {}", principal.get_username()))
}

/// `/admin/**` - ADMIN only.
#[get("/admin")]
pub async fn admin(principal: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().body(format!("admin: {}", principal.get_username()))
}
