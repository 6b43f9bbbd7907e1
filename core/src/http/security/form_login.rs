//! Form-based Login Authentication.
//!
//! # Spring Security Equivalent
//! `formLogin()` and `logout()` configuration
//!
//! # Features
//! - POST-based login form processing
//! - Configurable login/logout URLs
//! - Saved request redirect after login
//! - Session cookie issued on success, removed on logout
//!
//! # Example
//! ```rust
//! use session_guard_core::http::security::form_login::FormLoginConfig;
//!
//! let form_login = FormLoginConfig::new()
//!     .login_page("/loginForm")
//!     .login_processing_url("/login")
//!     .default_success_url("/")
//!     .permit_all(true);
//!
//! assert_eq!(form_login.get_failure_url(), "/loginForm?error");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::http::error::LoginError;
use crate::http::security::access::{AccessRule, RequestMatcher, Requirement};
use crate::http::security::session_manager::SessionManager;

// =============================================================================
// Form Login Configuration
// =============================================================================

/// Form login configuration.
///
/// # Spring Security Equivalent
/// `FormLoginConfigurer` and `LogoutConfigurer`
#[derive(Debug, Clone)]
pub struct FormLoginConfig {
    /// URL of the login page (GET)
    login_page: String,
    /// URL that processes login form (POST)
    login_processing_url: String,
    username_parameter: String,
    password_parameter: String,
    default_success_url: String,
    /// Ignore the saved request
    always_use_default_success_url: bool,
    /// None = `<login_page>?error`
    failure_url: Option<String>,
    logout_url: String,
    /// None = `<login_page>?logout`
    logout_success_url: Option<String>,
    /// Allow everyone to reach the login page and processing URL
    permit_all: bool,
}

impl Default for FormLoginConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLoginConfig {
    pub fn new() -> Self {
        Self {
            login_page: "/login".to_string(),
            login_processing_url: "/login".to_string(),
            username_parameter: "username".to_string(),
            password_parameter: "password".to_string(),
            default_success_url: "/".to_string(),
            always_use_default_success_url: false,
            failure_url: None,
            logout_url: "/logout".to_string(),
            logout_success_url: None,
            permit_all: false,
        }
    }

    /// # Spring Equivalent
    /// `formLogin().loginPage("/loginForm")`
    pub fn login_page(mut self, url: &str) -> Self {
        self.login_page = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().loginProcessingUrl("/login")`
    pub fn login_processing_url(mut self, url: &str) -> Self {
        self.login_processing_url = url.to_string();
        self
    }

    pub fn username_parameter(mut self, param: &str) -> Self {
        self.username_parameter = param.to_string();
        self
    }

    pub fn password_parameter(mut self, param: &str) -> Self {
        self.password_parameter = param.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/")`
    pub fn default_success_url(mut self, url: &str) -> Self {
        self.default_success_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/", true)`
    pub fn always_use_default_success_url(mut self, always: bool) -> Self {
        self.always_use_default_success_url = always;
        self
    }

    pub fn failure_url(mut self, url: &str) -> Self {
        self.failure_url = Some(url.to_string());
        self
    }

    pub fn logout_url(mut self, url: &str) -> Self {
        self.logout_url = url.to_string();
        self
    }

    pub fn logout_success_url(mut self, url: &str) -> Self {
        self.logout_success_url = Some(url.to_string());
        self
    }

    /// # Spring Equivalent
    /// `formLogin().permitAll()`
    pub fn permit_all(mut self, permit: bool) -> Self {
        self.permit_all = permit;
        self
    }

    pub fn get_login_page(&self) -> &str {
        &self.login_page
    }

    pub fn get_login_processing_url(&self) -> &str {
        &self.login_processing_url
    }

    pub fn get_username_parameter(&self) -> &str {
        &self.username_parameter
    }

    pub fn get_password_parameter(&self) -> &str {
        &self.password_parameter
    }

    pub fn get_default_success_url(&self) -> &str {
        &self.default_success_url
    }

    pub fn is_always_use_default_success_url(&self) -> bool {
        self.always_use_default_success_url
    }

    pub fn get_failure_url(&self) -> String {
        self.failure_url
            .clone()
            .unwrap_or_else(|| format!("{}?error", self.login_page))
    }

    pub fn get_logout_url(&self) -> &str {
        &self.logout_url
    }

    pub fn get_logout_success_url(&self) -> String {
        self.logout_success_url
            .clone()
            .unwrap_or_else(|| format!("{}?logout", self.login_page))
    }

    pub fn is_permit_all(&self) -> bool {
        self.permit_all
    }

    /// Public rules for the login endpoints when `permit_all` is set.
    pub fn public_rules(&self) -> Vec<AccessRule> {
        if !self.permit_all {
            return Vec::new();
        }
        let mut urls = vec![self.login_page.as_str()];
        if self.login_processing_url != self.login_page {
            urls.push(&self.login_processing_url);
        }
        urls.into_iter()
            .map(|url| AccessRule::new(RequestMatcher::ant(url), Requirement::Public))
            .collect()
    }
}

// =============================================================================
// Login Form Data
// =============================================================================

/// Submitted credentials.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Reads the credentials from raw form fields using the configured
    /// parameter names. Missing fields are empty and fail authentication.
    pub fn from_params(params: &HashMap<String, String>, config: &FormLoginConfig) -> Self {
        let field = |name: &str| params.get(name).cloned().unwrap_or_default();
        Self {
            username: field(config.get_username_parameter()),
            password: field(config.get_password_parameter()),
        }
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[PROTECTED]")
            .finish()
    }
}

// =============================================================================
// Form Login Handler
// =============================================================================

/// Processes login and logout requests.
///
/// # Spring Security Equivalent
/// `UsernamePasswordAuthenticationFilter`, `SavedRequestAwareAuthenticationSuccessHandler`
/// and `LogoutFilter`
///
/// # Example
/// ```rust,ignore
/// async fn login(
///     req: HttpRequest,
///     form: web::Form<HashMap<String, String>>,
///     chain: web::Data<SecurityFilterChain>,
/// ) -> HttpResponse {
///     let handler = chain.form_login();
///     let form = LoginForm::from_params(&form, handler.config());
///     handler.attempt_authentication(&req, &form).await
/// }
/// ```
#[derive(Clone)]
pub struct FormLoginHandler {
    config: FormLoginConfig,
    sessions: Arc<SessionManager>,
}

impl FormLoginHandler {
    pub fn new(config: FormLoginConfig, sessions: Arc<SessionManager>) -> Self {
        Self { config, sessions }
    }

    /// Logs the user in and redirects.
    ///
    /// Success goes to the saved request (or the default success URL) with
    /// a new session cookie. Every failure goes to the failure URL, so the
    /// response does not tell an unknown user from a wrong password.
    pub async fn attempt_authentication(&self, req: &HttpRequest, form: &LoginForm) -> HttpResponse {
        let pre_login = self.session_id(req);

        match self
            .sessions
            .login(&form.username, &form.password, pre_login.as_deref())
            .await
        {
            Ok(mut session) => {
                let saved = match self.sessions.take_saved_request(&mut session).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        log::warn!("Could not read saved request: {}", e);
                        None
                    }
                };
                let target = match saved {
                    Some(url) if !self.config.always_use_default_success_url => url,
                    _ => self.config.default_success_url.clone(),
                };

                HttpResponse::Found()
                    .insert_header((LOCATION, target))
                    .cookie(self.session_cookie(session.get_id()))
                    .finish()
            }
            Err(LoginError::Rejected(reason)) => {
                log::info!("Login refused for {}: {}", form.username, reason);
                self.on_authentication_failure()
            }
            Err(e @ LoginError::Storage(_)) => {
                log::error!("Login for {} failed: {}", form.username, e);
                self.on_authentication_failure()
            }
        }
    }

    pub fn on_authentication_failure(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((LOCATION, self.config.get_failure_url()))
            .finish()
    }

    /// Invalidates the session, removes the cookie and redirects.
    pub async fn logout(&self, req: &HttpRequest) -> HttpResponse {
        if let Some(id) = self.session_id(req) {
            if let Err(e) = self.sessions.logout(&id).await {
                log::error!("Logout failed: {}", e);
            }
        }

        HttpResponse::Found()
            .insert_header((LOCATION, self.config.get_logout_success_url()))
            .cookie(self.removal_cookie())
            .finish()
    }

    /// The session id the client sent, if any.
    pub fn session_id(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(self.sessions.config().get_cookie_name())
            .map(|c| c.value().to_string())
    }

    pub fn session_cookie(&self, session_id: &str) -> Cookie<'static> {
        let config = self.sessions.config();
        Cookie::build(config.get_cookie_name().to_string(), session_id.to_string())
            .path("/")
            .http_only(true)
            .secure(config.is_cookie_secure())
            .same_site(SameSite::Lax)
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.sessions.config().get_cookie_name().to_string(), "")
            .path("/")
            .finish();
        cookie.make_removal();
        cookie
    }

    pub fn is_login_page(&self, path: &str) -> bool {
        path == self.config.login_page
    }

    pub fn is_login_processing_url(&self, path: &str) -> bool {
        path == self.config.login_processing_url
    }

    pub fn is_logout_url(&self, path: &str) -> bool {
        path == self.config.logout_url
    }

    pub fn config(&self) -> &FormLoginConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}
