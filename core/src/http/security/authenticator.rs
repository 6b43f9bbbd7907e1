//! Username/password verification against the identity adapter.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.authentication.dao.DaoAuthenticationProvider`

use std::sync::Arc;

use crate::http::error::{AuthenticationError, LoginError};
use crate::http::security::crypto::PasswordEncoder;
use crate::http::security::identity::Identity;
use crate::http::security::user_details::{IdentityAdapter, IdentityError};

const USER_NOT_FOUND_PASSWORD: &str = "userNotFoundPassword";

/// Checks submitted credentials and account status.
#[derive(Clone)]
pub struct DaoAuthenticationProvider {
    identities: IdentityAdapter,
    password_encoder: Arc<dyn PasswordEncoder>,
    /// Hash compared against when the user does not exist, so both
    /// failure paths pay for one hash verification.
    user_not_found_hash: Option<String>,
}

impl DaoAuthenticationProvider {
    pub fn new(identities: IdentityAdapter, password_encoder: Arc<dyn PasswordEncoder>) -> Self {
        let user_not_found_hash = match password_encoder.encode(USER_NOT_FOUND_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("Timing attack protection disabled: {}", e);
                None
            }
        };
        Self {
            identities,
            password_encoder,
            user_not_found_hash,
        }
    }

    /// Returns the verified identity, or why it was refused.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let identity = match self.identities.load_by_username(username).await {
            Ok(identity) => identity,
            Err(IdentityError::NotFound) => {
                if let Some(hash) = &self.user_not_found_hash {
                    let _ = self.password_encoder.matches(password, hash);
                }
                return Err(AuthenticationError::UserNotFound.into());
            }
            Err(IdentityError::Storage(e)) => return Err(LoginError::Storage(e)),
        };

        check_account_status(&identity)?;

        if !self.password_encoder.matches(password, identity.get_password()) {
            return Err(AuthenticationError::BadCredentials.into());
        }

        if !identity.is_credentials_non_expired() {
            return Err(AuthenticationError::CredentialsExpired.into());
        }

        if self.password_encoder.upgrade_encoding(identity.get_password()) {
            log::info!("Stored password for {} should be re-encoded", username);
        }

        Ok(identity)
    }

    pub fn identities(&self) -> &IdentityAdapter {
        &self.identities
    }
}

/// Checks run before the password comparison.
///
/// # Spring Security Equivalent
/// `AccountStatusUserDetailsChecker` (pre-authentication checks)
fn check_account_status(identity: &Identity) -> Result<(), AuthenticationError> {
    if !identity.is_account_non_locked() {
        return Err(AuthenticationError::AccountLocked);
    }
    if !identity.is_enabled() {
        return Err(AuthenticationError::AccountDisabled);
    }
    if !identity.is_account_non_expired() {
        return Err(AuthenticationError::AccountExpired);
    }
    Ok(())
}
