//! Loading identities from the application's user storage.
//!
//! # Spring Security Equivalent
//! `UserDetailsService.loadUserByUsername`
//!
//! The storage itself stays outside this crate behind [`UserRepository`].
//! [`IdentityAdapter`] turns a stored [`UserRecord`] into the [`Identity`]
//! the login flow checks credentials against.
//!
//! # Example
//! ```rust,ignore
//! use session_guard_core::http::security::user_details::{UserRepository, IdentityError};
//! use async_trait::async_trait;
//!
//! struct PgUserRepository { pool: PgPool }
//!
//! #[async_trait]
//! impl UserRepository for PgUserRepository {
//!     async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
//!         sqlx::query_as("SELECT username, password, role FROM users WHERE username = $1")
//!             .bind(username)
//!             .fetch_optional(&self.pool)
//!             .await
//!             .map_err(|e| IdentityError::Storage(e.to_string()))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::http::security::identity::{Identity, UserRecord};

/// Errors when resolving an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// No record for the username
    NotFound,
    /// The user repository failed
    Storage(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::NotFound => write!(f, "User not found"),
            IdentityError::Storage(e) => write!(f, "User storage error: {}", e),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Lookup into the application's user storage.
///
/// `Ok(None)` means the user does not exist; `Err` is reserved for
/// storage failures.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError>;
}

/// Reference repository kept in memory.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the existing record untouched, if the
    /// username is taken.
    pub async fn save(&self, record: UserRecord) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(&record.username) {
            log::warn!("User {} already exists, skipping", record.username);
            return false;
        }
        users.insert(record.username.clone(), record);
        true
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

/// Resolves a username to an [`Identity`].
///
/// # Spring Security Equivalent
/// A `UserDetailsService` bean wrapping the user repository
#[derive(Clone)]
pub struct IdentityAdapter {
    repository: Arc<dyn UserRepository>,
}

impl IdentityAdapter {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// A missing user is the value `Err(IdentityError::NotFound)`, never a panic.
    pub async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError> {
        log::debug!("Loading identity for username: {}", username);
        match self.repository.find_by_username(username).await? {
            Some(record) => {
                log::debug!("Resolved {} with role {}", record.username, record.role);
                Ok(Identity::from(record))
            }
            None => Err(IdentityError::NotFound),
        }
    }
}
