//! Security middleware for Actix Web.
//!
//! # Spring Equivalent
//! `SecurityFilterChain` / `FilterChainProxy`

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use actix_service::{Service, Transform};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{Error, HttpMessage, HttpResponse, ResponseError};
use futures_util::future::{ok, LocalBoxFuture, Ready};

use crate::http::error::AuthenticationError;
use crate::http::security::access::Decision;
use crate::http::security::config::SecurityFilterChain;
use crate::http::security::events::SecurityEvent;
use crate::http::security::firewall;
use crate::http::security::session_manager::SessionStatus;

/// Security middleware factory.
///
/// # Spring Equivalent
/// `SecurityFilterChain`
///
/// # Example
/// ```ignore
/// let chain = Arc::new(HttpSecurity::new(repository, encoder).build());
/// App::new()
///     .app_data(web::Data::from(chain.clone()))
///     .wrap(SecurityTransform::new(chain))
/// ```
pub struct SecurityTransform {
    chain: Arc<SecurityFilterChain>,
}

impl SecurityTransform {
    pub fn new(chain: Arc<SecurityFilterChain>) -> Self {
        SecurityTransform { chain }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityTransform
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SecurityService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecurityService {
            chain: Arc::clone(&self.chain),
            service: Rc::new(service),
        })
    }
}

/// Security middleware service.
///
/// # Spring Equivalent
/// `FilterChainProxy`
pub struct SecurityService<S> {
    chain: Arc<SecurityFilterChain>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let chain = Arc::clone(&self.chain);

        Box::pin(async move {
            let now = Instant::now();
            // The router matches the percent-decoded path, so rules do too.
            let path = req.match_info().as_str().to_string();
            if let Some(reason) = firewall::reject_reason(&path) {
                log::debug!("Rejected request to {}: {}", req.path(), reason);
                let response = HttpResponse::BadRequest().finish();
                return Ok(req.into_response(response).map_into_right_body());
            }
            req.extensions_mut().insert(Arc::clone(&chain));

            let form_login = chain.form_login();
            let sessions = chain.sessions();

            let cookie_id = req
                .cookie(sessions.config().get_cookie_name())
                .map(|c| c.value().to_string());

            // Step 1: resolve the session cookie
            let status = match &cookie_id {
                Some(id) => sessions.resolve_at(id, now).await?,
                None => SessionStatus::Missing,
            };

            // Step 2: expired sessions go to the expired URL, except on the
            // login endpoints where they count as no session
            let session = match status {
                SessionStatus::Active(session) => Some(session),
                SessionStatus::Expired(session) => {
                    if form_login.is_login_page(&path) || form_login.is_login_processing_url(&path)
                    {
                        None
                    } else {
                        log::debug!("Expired session on {}, redirecting", path);
                        sessions.expire(&session, &path).await?;
                        let response = HttpResponse::Found()
                            .insert_header((LOCATION, chain.expired_url()))
                            .cookie(form_login.removal_cookie())
                            .finish();
                        return Ok(req.into_response(response).map_into_right_body());
                    }
                }
                SessionStatus::Missing => None,
            };

            // Step 3: authorize
            match chain.policy().evaluate_at(&path, session.as_ref(), now) {
                Decision::Allow => {
                    if let Some(session) = session {
                        let mut extensions = req.extensions_mut();
                        if let Some(principal) = session.get_principal() {
                            extensions.insert(principal.clone());
                        }
                        extensions.insert(session);
                    }
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Decision::RedirectToLogin => {
                    let response = chain.commence(req.request(), session, now).await?;
                    Ok(req.into_response(response).map_into_right_body())
                }
                Decision::DenyForbidden => {
                    let username = session
                        .as_ref()
                        .and_then(|s| s.owner_username())
                        .unwrap_or_default();
                    sessions
                        .events()
                        .publish(SecurityEvent::access_denied(username, &path));
                    let response = AuthenticationError::Forbidden.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
