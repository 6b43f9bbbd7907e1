//! Routes that check roles at handler entry.
//!
//! # Spring Security Equivalent
//! `@Secured` and `@PreAuthorize` annotations

use actix_web::{get, HttpResponse};

use session_guard_core::http::error::AuthenticationError;
use session_guard_core::http::security::AuthenticatedUser;

/// # Spring Security Equivalent
/// `@Secured("ROLE_ADMIN")`
#[get("/info")]
pub async fn info(principal: AuthenticatedUser) -> Result<HttpResponse, AuthenticationError> {
    principal.require_role("ADMIN")?;
    Ok(HttpResponse::Ok().body("personal info"))
}

/// # Spring Security Equivalent
/// `@PreAuthorize("hasRole('ROLE_MANAGER') or hasRole('ROLE_ADMIN')")`
#[get("/data")]
pub async fn data(principal: AuthenticatedUser) -> Result<HttpResponse, AuthenticationError> {
    principal.require_any_role(&["MANAGER", "ADMIN"])?;
    Ok(HttpResponse::Ok().body("data"))
}
