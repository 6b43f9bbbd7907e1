//! Server-side sessions.
//!
//! # Spring Security Equivalent
//! `HttpSession` storage plus the `sessionManagement()` configurer
//!
//! # Features
//! - Explicit session store trait (create, get, touch, change id, invalidate, list by user)
//! - Anonymous pre-login sessions carrying the saved request
//! - Session fixation protection by id regeneration on login
//! - Sliding inactivity timeout
//!
//! Every [`SessionStore`] operation is atomic for the session id it
//! touches. [`InMemorySessionStore`] takes its write lock once per call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use tokio::sync::RwLock;

use crate::http::security::identity::Principal;

const SESSION_ID_LENGTH: usize = 32;

/// Attribute holding the URL requested before the login redirect.
pub const SAVED_REQUEST_ATTRIBUTE: &str = "SPRING_SECURITY_SAVED_REQUEST";

/// Generates a fresh random session id.
pub fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

// =============================================================================
// Session
// =============================================================================

/// A server-side session.
///
/// Sessions without a principal are anonymous: they only exist to carry
/// attributes (the saved request) across the login redirect.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    principal: Option<Principal>,
    attributes: HashMap<String, String>,
    created_at: Instant,
    last_accessed_at: Instant,
    expires_at: Instant,
    max_inactive_interval: Duration,
    expired: bool,
}

impl Session {
    pub fn new(id: String, max_inactive_interval: Duration, now: Instant) -> Self {
        Self {
            id,
            principal: None,
            attributes: HashMap::new(),
            created_at: now,
            last_accessed_at: now,
            expires_at: now + max_inactive_interval,
            max_inactive_interval,
            expired: false,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// The username of the authenticated owner, if any.
    pub fn owner_username(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.get_username())
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// True once timed out or evicted by concurrent session control.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expired || now >= self.expires_at
    }

    /// Evicted by concurrent session control (as opposed to timed out).
    pub fn is_marked_expired(&self) -> bool {
        self.expired
    }

    /// Records an access and slides the expiry forward.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
        self.expires_at = self.last_accessed_at + self.max_inactive_interval;
    }

    fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

// =============================================================================
// Session Fixation Strategy
// =============================================================================

/// What happens to the pre-login session when a user logs in.
///
/// Both strategies issue a new id, so a session id known before login
/// is never valid after it.
///
/// # Spring Security Equivalent
/// `sessionManagement().sessionFixation()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionFixationStrategy {
    /// New id, attributes kept.
    ///
    /// # Spring Equivalent
    /// `sessionFixation().changeSessionId()`
    #[default]
    ChangeSessionId,

    /// New id, attributes dropped.
    ///
    /// # Spring Equivalent
    /// `sessionFixation().newSession()`
    NewSession,
}

// =============================================================================
// Session Management Configuration
// =============================================================================

/// Session management configuration.
///
/// # Spring Security Equivalent
/// `SessionManagementConfigurer` and `ConcurrencyControlConfigurer`
///
/// # Example
/// ```rust
/// use session_guard_core::http::security::session::{
///     SessionFixationStrategy, SessionManagementConfig,
/// };
///
/// let config = SessionManagementConfig::new()
///     .fixation_strategy(SessionFixationStrategy::ChangeSessionId)
///     .maximum_sessions(1)
///     .max_sessions_prevents_login(true)
///     .expired_url("/loginForm");
///
/// assert_eq!(config.get_maximum_sessions(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct SessionManagementConfig {
    fixation_strategy: SessionFixationStrategy,
    /// None = unlimited
    maximum_sessions: Option<usize>,
    max_sessions_prevents_login: bool,
    /// Where requests carrying an expired session go; None = the login page
    expired_url: Option<String>,
    timeout: Duration,
    /// Minimum time between two sweeps of timed-out sessions
    cleanup_interval: Duration,
    cookie_name: String,
    cookie_secure: bool,
}

impl Default for SessionManagementConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagementConfig {
    pub fn new() -> Self {
        Self {
            fixation_strategy: SessionFixationStrategy::ChangeSessionId,
            maximum_sessions: Some(1),
            max_sessions_prevents_login: false,
            expired_url: None,
            timeout: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(60),
            cookie_name: "SESSION".to_string(),
            cookie_secure: false,
        }
    }

    /// # Spring Equivalent
    /// `sessionFixation().changeSessionId()` / `.newSession()`
    pub fn fixation_strategy(mut self, strategy: SessionFixationStrategy) -> Self {
        self.fixation_strategy = strategy;
        self
    }

    /// # Spring Equivalent
    /// `maximumSessions(1)`
    pub fn maximum_sessions(mut self, max: usize) -> Self {
        self.maximum_sessions = Some(max);
        self
    }

    pub fn unlimited_sessions(mut self) -> Self {
        self.maximum_sessions = None;
        self
    }

    /// `true` rejects a login once the cap is reached; `false` expires the
    /// user's least recently used session to make room.
    ///
    /// # Spring Equivalent
    /// `maxSessionsPreventsLogin(true)`
    pub fn max_sessions_prevents_login(mut self, prevents: bool) -> Self {
        self.max_sessions_prevents_login = prevents;
        self
    }

    /// # Spring Equivalent
    /// `expiredUrl("/loginForm")`
    pub fn expired_url(mut self, url: &str) -> Self {
        self.expired_url = Some(url.to_string());
        self
    }

    /// Inactivity timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timed-out sessions are swept when a session is created, at most
    /// once per `interval`.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    pub fn cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn get_fixation_strategy(&self) -> SessionFixationStrategy {
        self.fixation_strategy
    }

    pub fn get_maximum_sessions(&self) -> Option<usize> {
        self.maximum_sessions
    }

    pub fn is_max_sessions_prevents_login(&self) -> bool {
        self.max_sessions_prevents_login
    }

    pub fn get_expired_url(&self) -> Option<&str> {
        self.expired_url.as_deref()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    pub fn get_cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn is_cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

// =============================================================================
// Session Error
// =============================================================================

/// Session store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session with this id already exists
    AlreadyExists,
    /// Backing storage failed
    Storage(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::AlreadyExists => write!(f, "Session already exists"),
            SessionError::Storage(e) => write!(f, "Session storage error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::InternalServerError().finish()
    }
}

// =============================================================================
// Session Store
// =============================================================================

/// Process-wide session storage.
///
/// # Spring Security Equivalent
/// `SessionRepository` / `SessionRegistry`
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fails with `AlreadyExists` on id collision.
    async fn create(&self, session: Session) -> Result<(), SessionError>;

    async fn get(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Insert or replace.
    async fn save(&self, session: Session) -> Result<(), SessionError>;

    /// Records an access. Returns the updated session; sessions that are
    /// already expired come back unchanged.
    async fn touch(&self, id: &str, now: Instant) -> Result<Option<Session>, SessionError>;

    /// Moves the session to `new_id`; the old id stops resolving.
    async fn change_id(&self, old_id: &str, new_id: String)
        -> Result<Option<Session>, SessionError>;

    /// Removes the session. Returns it if it was present.
    async fn invalidate(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Flags the session as evicted; it stays stored so the next request
    /// can be told it expired. Returns false if unknown.
    async fn mark_expired(&self, id: &str) -> Result<bool, SessionError>;

    /// Authenticated sessions owned by `username`, expired ones included.
    async fn list_by_user(&self, username: &str) -> Result<Vec<Session>, SessionError>;

    /// Drops sessions whose inactivity timeout has passed at `now`. Evicted
    /// sessions stay until they time out. Returns how many were dropped.
    async fn purge_expired(&self, now: Instant) -> Result<usize, SessionError>;
}

/// Session store kept in process memory.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.get_id()) {
            return Err(SessionError::AlreadyExists);
        }
        sessions.insert(session.get_id().to_string(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: Session) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(session.get_id().to_string(), session);
        Ok(())
    }

    async fn touch(&self, id: &str, now: Instant) -> Result<Option<Session>, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(id).map(|session| {
            if !session.is_expired(now) {
                session.touch(now);
            }
            session.clone()
        }))
    }

    async fn change_id(
        &self,
        old_id: &str,
        new_id: String,
    ) -> Result<Option<Session>, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&new_id) {
            return Err(SessionError::AlreadyExists);
        }
        Ok(sessions.remove(old_id).map(|session| {
            let moved = session.with_id(new_id.clone());
            sessions.insert(new_id, moved.clone());
            moved
        }))
    }

    async fn invalidate(&self, id: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.write().await.remove(id))
    }

    async fn mark_expired(&self, id: &str) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(match sessions.get_mut(id) {
            Some(session) => {
                session.expired = true;
                true
            }
            None => false,
        })
    }

    async fn list_by_user(&self, username: &str) -> Result<Vec<Session>, SessionError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.owner_username() == Some(username))
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, now: Instant) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| now < session.expires_at);
        Ok(before - sessions.len())
    }
}
