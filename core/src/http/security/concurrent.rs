//! Concurrent session control.
//!
//! # Spring Security Equivalent
//! `ConcurrentSessionControlAuthenticationStrategy` with
//! `maximumSessions(n)` and `maxSessionsPreventsLogin(bool)`
//!
//! The decision itself ([`ConcurrentSessionControl::check`]) is a pure
//! function over the user's current sessions. Callers hold the guard from
//! [`ConcurrentSessionControl::lock_user`] from counting until the new
//! session is stored, so two logins for one user cannot both pass the check.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::http::error::AuthenticationError;
use crate::http::security::session::Session;

pub struct ConcurrentSessionControl {
    /// None = unlimited
    maximum_sessions: Option<usize>,
    prevents_login: bool,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConcurrentSessionControl {
    /// A cap of 0 is treated as 1.
    pub fn new(maximum_sessions: Option<usize>, prevents_login: bool) -> Self {
        Self {
            maximum_sessions: maximum_sessions.map(|max| max.max(1)),
            prevents_login,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, false)
    }

    pub fn maximum_sessions(&self) -> Option<usize> {
        self.maximum_sessions
    }

    pub fn prevents_login(&self) -> bool {
        self.prevents_login
    }

    /// Serializes logins for one username. The guard must live until the
    /// admitted session is in the store.
    pub async fn lock_user(&self, username: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.user_locks.lock().await;
            locks
                .entry(username.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Decides whether one more session may be admitted.
    ///
    /// `sessions` are the user's stored sessions. Expired ones and
    /// `current_id` (the pre-login session being replaced) do not count.
    /// Returns the ids to expire, least recently used first, or
    /// `SessionCapExceeded` when the cap is reached and logins are refused.
    pub fn check(
        &self,
        sessions: &[Session],
        current_id: Option<&str>,
        now: Instant,
    ) -> Result<Vec<String>, AuthenticationError> {
        let max = match self.maximum_sessions {
            Some(max) => max,
            None => return Ok(Vec::new()),
        };

        let mut live: Vec<&Session> = sessions
            .iter()
            .filter(|s| !s.is_expired(now))
            .filter(|s| Some(s.get_id()) != current_id)
            .collect();

        if live.len() < max {
            return Ok(Vec::new());
        }

        if self.prevents_login {
            return Err(AuthenticationError::SessionCapExceeded);
        }

        live.sort_by_key(|s| s.last_accessed_at());
        let excess = live.len() + 1 - max;
        Ok(live
            .into_iter()
            .take(excess)
            .map(|s| s.get_id().to_string())
            .collect())
    }
}
