//! Extractors for accessing security context in handlers.
//!
//! # Spring Equivalent
//! `@AuthenticationPrincipal` annotation / `SecurityContextHolder`
//!
//! The security middleware puts the [`Principal`] and [`Session`] of an
//! allowed request into the request extensions; these extractors read them.

use std::future::{ready, Ready};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::http::error::AuthenticationError;
use crate::http::security::config::SecurityFilterChain;
use crate::http::security::identity::Principal;
use crate::http::security::session::Session;

/// Extractor for the authenticated principal.
///
/// # Spring Equivalent
/// `@AuthenticationPrincipal` parameter
///
/// # Usage
/// ```ignore
/// async fn info(user: AuthenticatedUser) -> Result<HttpResponse, AuthenticationError> {
///     user.require_role("ADMIN")?; // @Secured("ROLE_ADMIN")
///     Ok(HttpResponse::Ok().body(format!("Hello, {}!", user.get_username())))
/// }
/// ```
///
/// # Errors
/// An unauthenticated request is sent to the login page, with the request
/// saved for after login. Outside the security middleware it gets
/// `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Principal);

impl AuthenticatedUser {
    pub fn new(principal: Principal) -> Self {
        AuthenticatedUser(principal)
    }

    pub fn into_inner(self) -> Principal {
        self.0
    }

    /// Entry check for a handler restricted to one role.
    ///
    /// # Spring Equivalent
    /// `@Secured("ROLE_ADMIN")`
    pub fn require_role(&self, role: &str) -> Result<(), AuthenticationError> {
        if self.0.has_role(role) {
            Ok(())
        } else {
            log::debug!("{} lacks role {}", self.0.get_username(), role);
            Err(AuthenticationError::Forbidden)
        }
    }

    /// # Spring Equivalent
    /// `@PreAuthorize("hasRole('MANAGER') or hasRole('ADMIN')")`
    pub fn require_any_role(&self, roles: &[&str]) -> Result<(), AuthenticationError> {
        if self.0.has_any_role(roles) {
            Ok(())
        } else {
            log::debug!("{} lacks all of {:?}", self.0.get_username(), roles);
            Err(AuthenticationError::Forbidden)
        }
    }
}

impl Deref for AuthenticatedUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let principal = extensions.get::<Principal>().cloned();
        let chain = extensions.get::<Arc<SecurityFilterChain>>().cloned();
        let session = extensions.get::<Session>().cloned();
        drop(extensions);
        let req = req.clone();

        Box::pin(async move {
            if let Some(principal) = principal {
                return Ok(AuthenticatedUser(principal));
            }
            let chain = match chain {
                Some(chain) => chain,
                None => return Err(AuthenticationError::Unauthorized.into()),
            };
            let response = chain.commence(&req, session, Instant::now()).await?;
            Err(InternalError::from_response(AuthenticationError::Unauthorized, response).into())
        })
    }
}

/// Optional extractor for the authenticated principal.
///
/// Returns `None` if not authenticated instead of an error.
#[derive(Debug, Clone)]
pub struct OptionalUser(Option<Principal>);

impl OptionalUser {
    pub fn into_inner(self) -> Option<Principal> {
        self.0
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl Deref for OptionalUser {
    type Target = Option<Principal>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for OptionalUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(Ok(OptionalUser(principal)))
    }
}

/// The session the request arrived with, authenticated or anonymous.
///
/// # Errors
/// Returns `401 Unauthorized` if the request carried no live session.
#[derive(Debug, Clone)]
pub struct CurrentSession(Session);

impl CurrentSession {
    pub fn into_inner(self) -> Session {
        self.0
    }
}

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentSession {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Session>().cloned() {
            Some(session) => ready(Ok(CurrentSession(session))),
            None => ready(Err(AuthenticationError::Unauthorized)),
        }
    }
}

/// Extension trait for HttpRequest to check authentication.
pub trait SecurityExt {
    fn get_principal(&self) -> Option<Principal>;

    fn is_authenticated(&self) -> bool;

    fn has_role(&self, role: &str) -> bool;

    fn has_any_role(&self, roles: &[&str]) -> bool;
}

impl SecurityExt for HttpRequest {
    fn get_principal(&self) -> Option<Principal> {
        self.extensions().get::<Principal>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.extensions().get::<Principal>().is_some()
    }

    fn has_role(&self, role: &str) -> bool {
        self.extensions()
            .get::<Principal>()
            .is_some_and(|p| p.has_role(role))
    }

    fn has_any_role(&self, roles: &[&str]) -> bool {
        self.extensions()
            .get::<Principal>()
            .is_some_and(|p| p.has_any_role(roles))
    }
}
