//! Security configuration.
//!
//! # Spring Equivalent
//! `HttpSecurity` and the `SecurityFilterChain` bean
//!
//! # Example
//! ```ignore
//! let chain = HttpSecurity::new(repository, Arc::new(BCryptPasswordEncoder::new()))
//!     .authorize_http_requests(
//!         AccessPolicy::new()
//!             .request_matchers(&["/admin/**"]).has_role("ADMIN")
//!             .any_request().permit_all(),
//!     )
//!     .form_login(FormLoginConfig::new().login_page("/loginForm").permit_all(true))
//!     .session_management(SessionManagementConfig::new().maximum_sessions(1))
//!     .build();
//!
//! App::new().wrap(SecurityTransform::new(Arc::new(chain)))
//! ```

use std::sync::Arc;
use std::time::Instant;

use actix_web::http::{header::LOCATION, Method};
use actix_web::{HttpRequest, HttpResponse};

use crate::http::security::access::AccessPolicy;
use crate::http::security::authenticator::DaoAuthenticationProvider;
use crate::http::security::crypto::PasswordEncoder;
use crate::http::security::events::{SecurityEventHandler, SecurityEventPublisher};
use crate::http::security::firewall;
use crate::http::security::form_login::{FormLoginConfig, FormLoginHandler};
use crate::http::security::session::{
    InMemorySessionStore, Session, SessionError, SessionManagementConfig, SessionStore,
};
use crate::http::security::session_manager::SessionManager;
use crate::http::security::user_details::{IdentityAdapter, UserRepository};

/// Builder for a [`SecurityFilterChain`].
pub struct HttpSecurity {
    repository: Arc<dyn UserRepository>,
    password_encoder: Arc<dyn PasswordEncoder>,
    policy: AccessPolicy,
    form_login: FormLoginConfig,
    session_management: SessionManagementConfig,
    session_store: Option<Arc<dyn SessionStore>>,
    events: SecurityEventPublisher,
}

impl HttpSecurity {
    /// Events are logged through the `log` facade unless replaced.
    pub fn new(
        repository: Arc<dyn UserRepository>,
        password_encoder: Arc<dyn PasswordEncoder>,
    ) -> Self {
        Self {
            repository,
            password_encoder,
            policy: AccessPolicy::new(),
            form_login: FormLoginConfig::new(),
            session_management: SessionManagementConfig::new(),
            session_store: None,
            events: SecurityEventPublisher::with_log(),
        }
    }

    /// # Spring Equivalent
    /// `http.authorizeHttpRequests(...)`
    pub fn authorize_http_requests(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// # Spring Equivalent
    /// `http.formLogin(...)`
    pub fn form_login(mut self, config: FormLoginConfig) -> Self {
        self.form_login = config;
        self
    }

    /// # Spring Equivalent
    /// `http.sessionManagement(...)`
    pub fn session_management(mut self, config: SessionManagementConfig) -> Self {
        self.session_management = config;
        self
    }

    /// Defaults to a fresh [`InMemorySessionStore`].
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Adds a handler next to the default log handler.
    pub fn event_handler<H: SecurityEventHandler + 'static>(mut self, handler: H) -> Self {
        self.events = self.events.add_handler(handler);
        self
    }

    /// Replaces every event handler.
    pub fn event_publisher(mut self, events: SecurityEventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> SecurityFilterChain {
        let store = self
            .session_store
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));
        let authenticator = DaoAuthenticationProvider::new(
            IdentityAdapter::new(self.repository),
            self.password_encoder,
        );
        let sessions = Arc::new(SessionManager::new(
            store,
            authenticator,
            self.session_management,
            self.events,
        ));

        let policy = self.policy.prepend_rules(self.form_login.public_rules());
        log::debug!("Security filter chain built with {} rules", policy.rules().len());

        SecurityFilterChain {
            policy,
            form_login: FormLoginHandler::new(self.form_login, Arc::clone(&sessions)),
            sessions,
        }
    }
}

/// Everything the security middleware and login endpoints need.
pub struct SecurityFilterChain {
    policy: AccessPolicy,
    form_login: FormLoginHandler,
    sessions: Arc<SessionManager>,
}

impl SecurityFilterChain {
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn form_login(&self) -> &FormLoginHandler {
        &self.form_login
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Where requests with an expired session are sent.
    pub fn expired_url(&self) -> &str {
        self.sessions
            .config()
            .get_expired_url()
            .unwrap_or_else(|| self.form_login.config().get_login_page())
    }

    /// Sends an unauthenticated request to the login page.
    ///
    /// `GET` requests are saved in `session` (or a new anonymous session,
    /// whose cookie is set) so the login can return to them.
    ///
    /// # Spring Equivalent
    /// `LoginUrlAuthenticationEntryPoint` with `HttpSessionRequestCache`
    pub async fn commence(
        &self,
        req: &HttpRequest,
        session: Option<Session>,
        now: Instant,
    ) -> Result<HttpResponse, SessionError> {
        let mut response = HttpResponse::Found();
        response.insert_header((LOCATION, self.form_login.config().get_login_page()));

        if *req.method() == Method::GET {
            let path = req.match_info().as_str();
            let url = match req.query_string() {
                "" => path.to_string(),
                query => format!("{}?{}", path, query),
            };
            if firewall::is_local_path(&url) {
                let cookie_id = self.form_login.session_id(req);
                let saved = self.sessions.save_request(session, &url, now).await?;
                if cookie_id.as_deref() != Some(saved.get_id()) {
                    response.cookie(self.form_login.session_cookie(saved.get_id()));
                }
            } else {
                log::debug!("Not saving non-local request {}", url);
            }
        }

        log::debug!("Unauthenticated request to {}, redirecting to login", req.path());
        Ok(response.finish())
    }
}
