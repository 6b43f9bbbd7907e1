//! Security events.
//!
//! Every login, logout and session lifecycle step is published as a
//! [`SecurityEvent`] to the handlers registered on a [`SecurityEventPublisher`].
//!
//! # Spring Security Equivalent
//! `AuthenticationEventPublisher` and `HttpSessionEventPublisher`
//!
//! # Example
//!
//! ```
//! use session_guard_core::http::security::events::{
//!     InMemoryEventStore, SecurityEvent, SecurityEventPublisher, SecurityEventType,
//! };
//!
//! let store = InMemoryEventStore::new();
//! let publisher = SecurityEventPublisher::new().add_handler(store.clone());
//!
//! publisher.publish(SecurityEvent::login_success("admin", "s1"));
//! assert_eq!(store.get_events_by_type(&SecurityEventType::AuthenticationSuccess).len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Serialize, Serializer};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    Logout,
    SessionCreated,
    /// Fixation defence issued a new id
    SessionIdChanged,
    SessionDestroyed,
    /// A request arrived with a timed-out or evicted session
    SessionExpired,
    /// Concurrency control expired a session to admit a new login
    SessionEvicted,
    /// A login was rejected because the user is at the session cap
    MaximumSessionsExceeded,
    AccessDenied,
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityEventType::AuthenticationSuccess => "AUTHENTICATION_SUCCESS",
            SecurityEventType::AuthenticationFailure => "AUTHENTICATION_FAILURE",
            SecurityEventType::Logout => "LOGOUT",
            SecurityEventType::SessionCreated => "SESSION_CREATED",
            SecurityEventType::SessionIdChanged => "SESSION_ID_CHANGED",
            SecurityEventType::SessionDestroyed => "SESSION_DESTROYED",
            SecurityEventType::SessionExpired => "SESSION_EXPIRED",
            SecurityEventType::SessionEvicted => "SESSION_EVICTED",
            SecurityEventType::MaximumSessionsExceeded => "MAXIMUM_SESSIONS_EXCEEDED",
            SecurityEventType::AccessDenied => "ACCESS_DENIED",
        };
        f.write_str(name)
    }
}

/// Severity level of security events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurityEventSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for SecurityEventSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityEventSeverity::Info => write!(f, "INFO"),
            SecurityEventSeverity::Warning => write!(f, "WARNING"),
            SecurityEventSeverity::Error => write!(f, "ERROR"),
        }
    }
}

impl SecurityEventSeverity {
    fn log_level(self) -> log::Level {
        match self {
            SecurityEventSeverity::Info => log::Level::Info,
            SecurityEventSeverity::Warning => log::Level::Warn,
            SecurityEventSeverity::Error => log::Level::Error,
        }
    }
}

impl SecurityEventType {
    pub fn default_severity(&self) -> SecurityEventSeverity {
        match self {
            SecurityEventType::AuthenticationSuccess
            | SecurityEventType::Logout
            | SecurityEventType::SessionCreated
            | SecurityEventType::SessionIdChanged
            | SecurityEventType::SessionDestroyed => SecurityEventSeverity::Info,

            SecurityEventType::SessionExpired
            | SecurityEventType::SessionEvicted
            | SecurityEventType::MaximumSessionsExceeded
            | SecurityEventType::AuthenticationFailure => SecurityEventSeverity::Warning,

            SecurityEventType::AccessDenied => SecurityEventSeverity::Error,
        }
    }
}

/// A published security event.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub id: String,
    /// Unix epoch milliseconds
    pub timestamp: u64,
    pub event_type: SecurityEventType,
    pub severity: SecurityEventSeverity,
    pub username: Option<String>,
    /// Masked when logged or serialized
    #[serde(serialize_with = "serialize_masked")]
    pub session_id: Option<String>,
    pub path: Option<String>,
    pub details: HashMap<String, String>,
    pub error: Option<String>,
}

impl SecurityEvent {
    pub fn new(event_type: SecurityEventType) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            id: generate_event_id(),
            timestamp,
            severity: event_type.default_severity(),
            event_type,
            username: None,
            session_id: None,
            path: None,
            details: HashMap::new(),
            error: None,
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Overrides the default severity.
    pub fn severity(mut self, severity: SecurityEventSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn login_success(username: &str, session_id: &str) -> Self {
        Self::new(SecurityEventType::AuthenticationSuccess)
            .username(username)
            .session_id(session_id)
    }

    pub fn login_failure(username: &str, reason: &str) -> Self {
        Self::new(SecurityEventType::AuthenticationFailure)
            .username(username)
            .error(reason)
    }

    pub fn session_created(username: Option<&str>, session_id: &str) -> Self {
        let event = Self::new(SecurityEventType::SessionCreated).session_id(session_id);
        match username {
            Some(username) => event.username(username),
            None => event,
        }
    }

    pub fn session_id_changed(username: &str, old_id: &str, new_id: &str) -> Self {
        Self::new(SecurityEventType::SessionIdChanged)
            .username(username)
            .session_id(new_id)
            .detail("previous_session_id", mask_session_id(old_id))
    }

    pub fn session_evicted(username: &str, session_id: &str) -> Self {
        Self::new(SecurityEventType::SessionEvicted)
            .username(username)
            .session_id(session_id)
    }

    pub fn session_expired(session_id: &str, path: &str) -> Self {
        Self::new(SecurityEventType::SessionExpired)
            .session_id(session_id)
            .path(path)
    }

    pub fn access_denied(username: &str, path: &str) -> Self {
        Self::new(SecurityEventType::AccessDenied)
            .username(username)
            .path(path)
    }

    /// Format the event as a log line.
    pub fn to_log_line(&self) -> String {
        let mut parts = vec![format!("[{}]", self.event_type)];

        if let Some(ref username) = self.username {
            parts.push(format!("user={}", username));
        }
        if let Some(ref session_id) = self.session_id {
            parts.push(format!("session={}", mask_session_id(session_id)));
        }
        if let Some(ref path) = self.path {
            parts.push(format!("path={}", path));
        }
        if let Some(ref error) = self.error {
            parts.push(format!("error=\"{}\"", error));
        }
        let mut details: Vec<_> = self.details.iter().collect();
        details.sort();
        for (k, v) in details {
            parts.push(format!("{}={}", k, v));
        }

        parts.join(" ")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_log_line())
    }
}

/// Session ids are bearer credentials; output only ever shows a prefix.
pub fn mask_session_id(id: &str) -> String {
    const VISIBLE: usize = 4;
    if id.chars().count() <= VISIBLE * 2 {
        return "****".to_string();
    }
    let prefix: String = id.chars().take(VISIBLE).collect();
    format!("{}****", prefix)
}

fn serialize_masked<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_some(&mask_session_id(id)),
        None => serializer.serialize_none(),
    }
}

fn generate_event_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp, random)
}

/// Receives published events.
pub trait SecurityEventHandler: Send + Sync {
    fn handle(&self, event: &SecurityEvent);
}

/// Forwards events to the `log` facade under the `security` target.
#[derive(Default)]
pub struct LogHandler {
    min_severity: SecurityEventSeverity,
    json: bool,
}

impl LogHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_severity(mut self, severity: SecurityEventSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Log events as JSON instead of `key=value` lines.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl SecurityEventHandler for LogHandler {
    fn handle(&self, event: &SecurityEvent) {
        if event.severity < self.min_severity {
            return;
        }
        let line = if self.json {
            event.to_json()
        } else {
            event.to_log_line()
        };
        log::log!(target: "security", event.severity.log_level(), "{}", line);
    }
}

/// Handler that calls a closure.
pub struct ClosureHandler<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    handler: F,
}

impl<F> ClosureHandler<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> SecurityEventHandler for ClosureHandler<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    fn handle(&self, event: &SecurityEvent) {
        (self.handler)(event);
    }
}

/// Keeps the most recent events in memory. Used by tests to assert on
/// what was published.
#[derive(Clone)]
pub struct InMemoryEventStore {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
    max_events: usize,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            max_events: 10000,
        }
    }

    pub fn max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    pub fn get_events(&self) -> Vec<SecurityEvent> {
        self.with_events(|events| events.clone())
    }

    pub fn get_events_by_type(&self, event_type: &SecurityEventType) -> Vec<SecurityEvent> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| &e.event_type == event_type)
                .cloned()
                .collect()
        })
    }

    pub fn get_events_by_user(&self, username: &str) -> Vec<SecurityEvent> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.username.as_deref() == Some(username))
                .cloned()
                .collect()
        })
    }

    pub fn clear(&self) {
        self.with_events(|events| events.clear());
    }

    fn with_events<R>(&self, f: impl FnOnce(&mut Vec<SecurityEvent>) -> R) -> R {
        // A panicking handler elsewhere must not hide the events recorded so far.
        let mut guard = self.events.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl SecurityEventHandler for InMemoryEventStore {
    fn handle(&self, event: &SecurityEvent) {
        let max = self.max_events;
        self.with_events(|events| {
            events.push(event.clone());
            if events.len() > max {
                events.remove(0);
            }
        });
    }
}

/// Fans events out to every registered handler.
#[derive(Clone, Default)]
pub struct SecurityEventPublisher {
    handlers: Vec<Arc<dyn SecurityEventHandler>>,
}

impl SecurityEventPublisher {
    /// A publisher with no handlers; events are dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that logs through [`LogHandler`].
    pub fn with_log() -> Self {
        Self::new().add_handler(LogHandler::new())
    }

    pub fn add_handler<H: SecurityEventHandler + 'static>(self, handler: H) -> Self {
        self.add_shared_handler(Arc::new(handler))
    }

    pub fn add_shared_handler(mut self, handler: Arc<dyn SecurityEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&SecurityEvent) + Send + Sync + 'static,
    {
        self.add_handler(ClosureHandler::new(handler))
    }

    pub fn publish(&self, event: SecurityEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
