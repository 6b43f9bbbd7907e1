//! User records, identities and principals.
//!
//! # Spring Equivalent
//! `UserDetails`, `GrantedAuthority` and the `Authentication` principal

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix Spring puts in front of role names when turning them into authorities.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Stored user as kept by the application's user repository.
///
/// Created by the registration flow, read-only for security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Encoded password, never plain text
    pub password: String,
    pub role: String,
}

impl UserRecord {
    pub fn new(username: &str, encoded_password: String, role: &str) -> Self {
        Self {
            username: username.to_string(),
            password: encoded_password,
            role: role.to_string(),
        }
    }
}

/// A single granted permission label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantedAuthority {
    authority: String,
}

impl GrantedAuthority {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    pub fn get_authority(&self) -> &str {
        &self.authority
    }

    /// The role this authority stands for, with any `ROLE_` prefix removed.
    pub fn role_name(&self) -> &str {
        self.authority
            .strip_prefix(ROLE_PREFIX)
            .unwrap_or(&self.authority)
    }

    /// Role comparison: `ADMIN` and `ROLE_ADMIN` name the same role.
    pub fn is_role(&self, role: &str) -> bool {
        self.role_name() == role.strip_prefix(ROLE_PREFIX).unwrap_or(role)
    }
}

impl From<&str> for GrantedAuthority {
    fn from(authority: &str) -> Self {
        Self::new(authority)
    }
}

impl fmt::Display for GrantedAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority)
    }
}

/// The identity the login flow authenticates against.
///
/// # Spring Equivalent
/// `UserDetails`
#[derive(Clone)]
pub struct Identity {
    username: String,
    password_hash: String,
    authorities: Vec<GrantedAuthority>,
    account_non_expired: bool,
    account_non_locked: bool,
    credentials_non_expired: bool,
    enabled: bool,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        authorities: Vec<GrantedAuthority>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            authorities,
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn account_non_locked(mut self, non_locked: bool) -> Self {
        self.account_non_locked = non_locked;
        self
    }

    pub fn account_non_expired(mut self, non_expired: bool) -> Self {
        self.account_non_expired = non_expired;
        self
    }

    pub fn credentials_non_expired(mut self, non_expired: bool) -> Self {
        self.credentials_non_expired = non_expired;
        self
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password_hash
    }

    pub fn get_authorities(&self) -> &[GrantedAuthority] {
        &self.authorities
    }

    pub fn is_account_non_expired(&self) -> bool {
        self.account_non_expired
    }

    pub fn is_account_non_locked(&self) -> bool {
        self.account_non_locked
    }

    pub fn is_credentials_non_expired(&self) -> bool {
        self.credentials_non_expired
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl From<UserRecord> for Identity {
    /// One role string becomes one authority; every status flag is set.
    fn from(record: UserRecord) -> Self {
        let authority = GrantedAuthority::new(record.role);
        Identity::new(record.username, record.password, vec![authority])
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"[PROTECTED]")
            .field("authorities", &self.authorities)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Authenticated principal held by a session. Carries no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    username: String,
    authorities: Vec<GrantedAuthority>,
}

impl Principal {
    pub fn new(username: impl Into<String>, authorities: Vec<GrantedAuthority>) -> Self {
        Self {
            username: username.into(),
            authorities,
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_authorities(&self) -> &[GrantedAuthority] {
        &self.authorities
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.authorities.iter().any(|a| a.is_role(role))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|role| self.has_role(role.as_ref()))
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities
            .iter()
            .any(|a| a.get_authority() == authority)
    }
}

impl From<&Identity> for Principal {
    fn from(identity: &Identity) -> Self {
        Principal::new(identity.get_username(), identity.get_authorities().to_vec())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authorities: Vec<&str> = self.authorities.iter().map(|a| a.get_authority()).collect();
        write!(
            f,
            "Principal {{ username: {}, authorities: {:?} }}",
            self.username, authorities
        )
    }
}
