//! Login, logout and session resolution.
//!
//! # Spring Security Equivalent
//! `CompositeSessionAuthenticationStrategy` (fixation protection plus
//! concurrency control), `ConcurrentSessionFilter` and `LogoutHandler`
//!
//! Login order:
//! 1. credentials are checked by the [`DaoAuthenticationProvider`]
//! 2. the username lock is taken
//! 3. concurrency control rejects the login or evicts older sessions
//! 4. the pre-login session gets a new id (fixation defence)
//! 5. the principal is stored and the lock released

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::http::error::LoginError;
use crate::http::security::authenticator::DaoAuthenticationProvider;
use crate::http::security::concurrent::ConcurrentSessionControl;
use crate::http::security::events::{SecurityEvent, SecurityEventPublisher, SecurityEventType};
use crate::http::security::identity::Principal;
use crate::http::security::session::{
    generate_session_id, Session, SessionError, SessionFixationStrategy,
    SessionManagementConfig, SessionStore, SAVED_REQUEST_ATTRIBUTE,
};

/// What a session id resolves to.
#[derive(Debug, Clone)]
pub enum SessionStatus {
    Active(Session),
    /// Timed out or evicted. Still stored until handled.
    Expired(Session),
    Missing,
}

impl SessionStatus {
    pub fn active(self) -> Option<Session> {
        match self {
            SessionStatus::Active(session) => Some(session),
            _ => None,
        }
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    authenticator: DaoAuthenticationProvider,
    config: SessionManagementConfig,
    concurrency: ConcurrentSessionControl,
    events: SecurityEventPublisher,
    last_cleanup: Mutex<Option<Instant>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        authenticator: DaoAuthenticationProvider,
        config: SessionManagementConfig,
        events: SecurityEventPublisher,
    ) -> Self {
        let concurrency = ConcurrentSessionControl::new(
            config.get_maximum_sessions(),
            config.is_max_sessions_prevents_login(),
        );
        Self {
            store,
            authenticator,
            config,
            concurrency,
            events,
            last_cleanup: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionManagementConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &SecurityEventPublisher {
        &self.events
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        pre_login_session_id: Option<&str>,
    ) -> Result<Session, LoginError> {
        self.login_at(username, password, pre_login_session_id, Instant::now())
            .await
    }

    /// Authenticates and returns the new authenticated session.
    ///
    /// The returned session never has `pre_login_session_id` as its id,
    /// and that id no longer resolves afterwards.
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        pre_login_session_id: Option<&str>,
        now: Instant,
    ) -> Result<Session, LoginError> {
        let identity = match self.authenticator.authenticate(username, password).await {
            Ok(identity) => identity,
            Err(e) => {
                log::debug!("Authentication failed for {}: {}", username, e);
                self.events
                    .publish(SecurityEvent::login_failure(username, &e.to_string()));
                return Err(e);
            }
        };
        let username = identity.get_username();

        let _guard = self.concurrency.lock_user(username).await;

        let mut existing = Vec::new();
        for session in self.store.list_by_user(username).await? {
            if now >= session.expires_at() {
                self.store.invalidate(session.get_id()).await?;
            } else {
                existing.push(session);
            }
        }

        let to_expire = match self.concurrency.check(&existing, pre_login_session_id, now) {
            Ok(ids) => ids,
            Err(e) => {
                log::info!("Maximum sessions reached for {}, login refused", username);
                self.events.publish(
                    SecurityEvent::new(SecurityEventType::MaximumSessionsExceeded)
                        .username(username)
                        .detail("active_sessions", existing.len().to_string()),
                );
                self.events
                    .publish(SecurityEvent::login_failure(username, &e.to_string()));
                return Err(e.into());
            }
        };

        for id in &to_expire {
            if self.store.mark_expired(id).await? {
                log::info!("Expired an older session of {} to admit a new login", username);
                self.events.publish(SecurityEvent::session_evicted(username, id));
            }
        }

        let mut session = self
            .fixate(username, pre_login_session_id, now)
            .await?;
        session.set_principal(Principal::from(&identity));
        session.touch(now);
        self.store.save(session.clone()).await?;

        log::debug!("{} logged in", username);
        self.events
            .publish(SecurityEvent::login_success(username, session.get_id()));
        Ok(session)
    }

    /// Produces the session the principal will be stored in. Always under
    /// a fresh id.
    async fn fixate(
        &self,
        username: &str,
        pre_login_session_id: Option<&str>,
        now: Instant,
    ) -> Result<Session, SessionError> {
        let previous = match pre_login_session_id {
            Some(id) => self.store.get(id).await?,
            None => None,
        };
        let previous = match previous {
            Some(stale) if stale.is_expired(now) => {
                self.store.invalidate(stale.get_id()).await?;
                None
            }
            previous => previous,
        };

        match (previous, self.config.get_fixation_strategy()) {
            (Some(previous), SessionFixationStrategy::ChangeSessionId) => {
                let new_id = generate_session_id();
                match self.store.change_id(previous.get_id(), new_id).await? {
                    Some(moved) => {
                        self.events.publish(SecurityEvent::session_id_changed(
                            username,
                            previous.get_id(),
                            moved.get_id(),
                        ));
                        Ok(moved)
                    }
                    // Invalidated concurrently; start over.
                    None => self.create_session(Some(username), now).await,
                }
            }
            (Some(previous), SessionFixationStrategy::NewSession) => {
                self.store.invalidate(previous.get_id()).await?;
                self.events.publish(
                    SecurityEvent::new(SecurityEventType::SessionDestroyed)
                        .username(username)
                        .session_id(previous.get_id()),
                );
                let mut fresh = self.create_session(Some(username), now).await?;
                // The saved request is security state, not application state.
                if let Some(saved) = previous.get_attribute(SAVED_REQUEST_ATTRIBUTE) {
                    fresh.set_attribute(SAVED_REQUEST_ATTRIBUTE, saved);
                }
                Ok(fresh)
            }
            (None, _) => self.create_session(Some(username), now).await,
        }
    }

    async fn create_session(
        &self,
        username: Option<&str>,
        now: Instant,
    ) -> Result<Session, SessionError> {
        self.sweep(now).await?;
        let session = Session::new(generate_session_id(), self.config.get_timeout(), now);
        self.store.create(session.clone()).await?;
        self.events
            .publish(SecurityEvent::session_created(username, session.get_id()));
        Ok(session)
    }

    /// Drops timed-out sessions, at most once per cleanup interval.
    async fn sweep(&self, now: Instant) -> Result<(), SessionError> {
        let interval = self.config.get_cleanup_interval();
        {
            let mut last = self.last_cleanup.lock().unwrap_or_else(|e| e.into_inner());
            if last.is_some_and(|at| now.saturating_duration_since(at) < interval) {
                return Ok(());
            }
            *last = Some(now);
        }
        let purged = self.store.purge_expired(now).await?;
        if purged > 0 {
            log::debug!("Purged {} timed-out sessions", purged);
        }
        Ok(())
    }

    /// Invalidates the session. Returns it if it existed.
    pub async fn logout(&self, session_id: &str) -> Result<Option<Session>, SessionError> {
        let removed = self.store.invalidate(session_id).await?;
        if let Some(session) = &removed {
            let mut event = SecurityEvent::new(SecurityEventType::Logout).session_id(session_id);
            if let Some(username) = session.owner_username() {
                log::debug!("{} logged out", username);
                event = event.username(username);
            }
            self.events.publish(event);
            self.events.publish(
                SecurityEvent::new(SecurityEventType::SessionDestroyed).session_id(session_id),
            );
        }
        Ok(removed)
    }

    pub async fn resolve(&self, session_id: &str) -> Result<SessionStatus, SessionError> {
        self.resolve_at(session_id, Instant::now()).await
    }

    /// Looks up the session and records the access if it is still live.
    pub async fn resolve_at(
        &self,
        session_id: &str,
        now: Instant,
    ) -> Result<SessionStatus, SessionError> {
        Ok(match self.store.touch(session_id, now).await? {
            Some(session) if session.is_expired(now) => SessionStatus::Expired(session),
            Some(session) => SessionStatus::Active(session),
            None => SessionStatus::Missing,
        })
    }

    /// Drops an expired session once the client has been told about it.
    pub async fn expire(&self, session: &Session, path: &str) -> Result<(), SessionError> {
        self.store.invalidate(session.get_id()).await?;
        let mut event = SecurityEvent::session_expired(session.get_id(), path);
        if let Some(username) = session.owner_username() {
            event = event.username(username);
        }
        self.events.publish(event);
        Ok(())
    }

    /// Remembers `url` for after login.
    ///
    /// Reuses `current` when it is an active session, otherwise creates an
    /// anonymous one. The returned session's id is what the client must
    /// send back.
    pub async fn save_request(
        &self,
        current: Option<Session>,
        url: &str,
        now: Instant,
    ) -> Result<Session, SessionError> {
        let mut session = match current.filter(|s| !s.is_expired(now)) {
            Some(session) => session,
            None => self.create_session(None, now).await?,
        };
        session.set_attribute(SAVED_REQUEST_ATTRIBUTE, url);
        self.store.save(session.clone()).await?;
        Ok(session)
    }

    /// Removes and returns the saved request of a session.
    pub async fn take_saved_request(
        &self,
        session: &mut Session,
    ) -> Result<Option<String>, SessionError> {
        let saved = session.remove_attribute(SAVED_REQUEST_ATTRIBUTE);
        if saved.is_some() {
            self.store.save(session.clone()).await?;
        }
        Ok(saved)
    }
}
