//! Password encoding.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.crypto.password.PasswordEncoder`
//!
//! # Feature Flags
//! - `bcrypt`: Enables `BCryptPasswordEncoder` (default)
//! - `argon2`: Enables `Argon2PasswordEncoder` (default)

#[cfg(feature = "argon2")]
use argon2::password_hash::rand_core::OsRng;
#[cfg(feature = "argon2")]
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
#[cfg(feature = "argon2")]
use argon2::Argon2;

/// Hashing failed; the raw password is never part of the message.
#[derive(Debug, Clone)]
pub struct PasswordEncodeError(String);

impl PasswordEncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for PasswordEncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password encoding failed: {}", self.0)
    }
}

impl std::error::Error for PasswordEncodeError {}

/// Encodes and verifies passwords.
///
/// # Spring Security Equivalent
/// `PasswordEncoder` interface
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw_password: &str) -> Result<String, PasswordEncodeError>;

    /// Never errors: a malformed stored hash simply does not match.
    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool;

    /// Returns true if the encoded password should be re-encoded.
    fn upgrade_encoding(&self, _encoded_password: &str) -> bool {
        false
    }
}

/// BCrypt encoder, the one the Spring configuration registers as a bean.
///
/// # Spring Security Equivalent
/// `BCryptPasswordEncoder`
///
/// ```ignore
/// use session_guard_core::http::security::crypto::{BCryptPasswordEncoder, PasswordEncoder};
///
/// let encoder = BCryptPasswordEncoder::with_cost(4);
/// let hash = encoder.encode("1234")?;
/// assert!(encoder.matches("1234", &hash));
/// ```
#[cfg(feature = "bcrypt")]
#[derive(Clone, Copy, Debug)]
pub struct BCryptPasswordEncoder {
    cost: u32,
}

#[cfg(feature = "bcrypt")]
impl BCryptPasswordEncoder {
    /// Cost 10, Spring's default strength.
    pub fn new() -> Self {
        Self { cost: 10 }
    }

    /// Clamped to bcrypt's valid range 4..=31.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

#[cfg(feature = "bcrypt")]
impl Default for BCryptPasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "bcrypt")]
impl PasswordEncoder for BCryptPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, PasswordEncodeError> {
        bcrypt::hash(raw_password, self.cost).map_err(|e| PasswordEncodeError::new(e.to_string()))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        bcrypt::verify(raw_password, encoded_password).unwrap_or(false)
    }

    fn upgrade_encoding(&self, encoded_password: &str) -> bool {
        // $2b$10$...
        encoded_password
            .get(4..6)
            .and_then(|cost| cost.parse::<u32>().ok())
            .map(|cost| cost < self.cost)
            .unwrap_or(true)
    }
}

/// Argon2id encoder.
///
/// # Spring Security Equivalent
/// `Argon2PasswordEncoder`
#[cfg(feature = "argon2")]
#[derive(Clone)]
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
}

#[cfg(feature = "argon2")]
impl Argon2PasswordEncoder {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "argon2")]
impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, PasswordEncodeError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw_password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordEncodeError::new(e.to_string()))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        PasswordHash::new(encoded_password)
            .map(|parsed| {
                self.argon2
                    .verify_password(raw_password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Plain-text encoder. Tests and fixtures only.
///
/// # Spring Security Equivalent
/// `NoOpPasswordEncoder`
#[derive(Clone, Copy, Default, Debug)]
pub struct NoOpPasswordEncoder;

impl PasswordEncoder for NoOpPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, PasswordEncodeError> {
        Ok(raw_password.to_string())
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        raw_password == encoded_password
    }
}

/// Picks the algorithm from a `{id}` prefix on the stored hash.
///
/// Recognised ids: `{bcrypt}`, `{argon2}`, `{noop}`. New passwords are
/// encoded with bcrypt and prefixed.
///
/// # Spring Security Equivalent
/// `DelegatingPasswordEncoder` (`PasswordEncoderFactories.createDelegatingPasswordEncoder()`)
#[cfg(all(feature = "bcrypt", feature = "argon2"))]
#[derive(Clone)]
pub struct DelegatingPasswordEncoder {
    bcrypt: BCryptPasswordEncoder,
    argon2: Argon2PasswordEncoder,
}

#[cfg(all(feature = "bcrypt", feature = "argon2"))]
impl DelegatingPasswordEncoder {
    pub fn new() -> Self {
        Self {
            bcrypt: BCryptPasswordEncoder::new(),
            argon2: Argon2PasswordEncoder::new(),
        }
    }

    /// Use a custom bcrypt encoder for new passwords.
    pub fn with_bcrypt(mut self, bcrypt: BCryptPasswordEncoder) -> Self {
        self.bcrypt = bcrypt;
        self
    }
}

#[cfg(all(feature = "bcrypt", feature = "argon2"))]
impl Default for DelegatingPasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "bcrypt", feature = "argon2"))]
impl PasswordEncoder for DelegatingPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, PasswordEncodeError> {
        Ok(format!("{{bcrypt}}{}", self.bcrypt.encode(raw_password)?))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        if let Some(hash) = encoded_password.strip_prefix("{bcrypt}") {
            self.bcrypt.matches(raw_password, hash)
        } else if let Some(hash) = encoded_password.strip_prefix("{argon2}") {
            self.argon2.matches(raw_password, hash)
        } else if let Some(plain) = encoded_password.strip_prefix("{noop}") {
            raw_password == plain
        } else {
            // No id: Spring refuses to guess, and so do we.
            false
        }
    }

    fn upgrade_encoding(&self, encoded_password: &str) -> bool {
        match encoded_password.strip_prefix("{bcrypt}") {
            Some(hash) => self.bcrypt.upgrade_encoding(hash),
            None => true,
        }
    }
}
