//! Security module providing authentication and authorization.
//!
//! # Spring Equivalent
//! `org.springframework.security` package
//!
//! # Module Structure
//!
//! - `access` - Ordered URL access rules (AccessPolicy)
//! - `ant_matcher` - Ant-style URL pattern matching
//! - `authenticator` - Credential and account status checks (DaoAuthenticationProvider)
//! - `concurrent` - Per-user session cap
//! - `config` - HttpSecurity builder and SecurityFilterChain
//! - `crypto` - Password encoding (BCrypt, Argon2, NoOp, Delegating)
//! - `events` - Security event publishing
//! - `extractor` - Actix Web extractors (AuthenticatedUser, OptionalUser, CurrentSession)
//! - `firewall` - Rejection of ambiguous request paths
//! - `form_login` - Login form processing and logout
//! - `identity` - User records, identities and principals
//! - `middleware` - Security middleware (SecurityTransform)
//! - `session` - Sessions, session store and session management configuration
//! - `session_manager` - Login, logout and session resolution
//! - `user_details` - Identity adapter over the user repository
//!
//! # Feature Flags
//! - `bcrypt`: Enables `BCryptPasswordEncoder`
//! - `argon2`: Enables `Argon2PasswordEncoder`
//! - both: Enable `DelegatingPasswordEncoder`

pub use access::{AccessPolicy, AccessRule, Decision, RequestMatcher, Requirement};
pub use ant_matcher::AntPathMatcher;
pub use authenticator::DaoAuthenticationProvider;
pub use config::{HttpSecurity, SecurityFilterChain};
pub use crypto::{NoOpPasswordEncoder, PasswordEncodeError, PasswordEncoder};
#[cfg(feature = "argon2")]
pub use crypto::Argon2PasswordEncoder;
#[cfg(feature = "bcrypt")]
pub use crypto::BCryptPasswordEncoder;
#[cfg(all(feature = "bcrypt", feature = "argon2"))]
pub use crypto::DelegatingPasswordEncoder;
pub use events::{
    InMemoryEventStore, LogHandler, SecurityEvent, SecurityEventHandler, SecurityEventPublisher,
    SecurityEventSeverity, SecurityEventType,
};
pub use extractor::{AuthenticatedUser, CurrentSession, OptionalUser, SecurityExt};
pub use form_login::{FormLoginConfig, FormLoginHandler, LoginForm};
pub use identity::{GrantedAuthority, Identity, Principal, UserRecord};
pub use middleware::SecurityTransform;
pub use session::{
    InMemorySessionStore, Session, SessionError, SessionFixationStrategy,
    SessionManagementConfig, SessionStore,
};
pub use session_manager::{SessionManager, SessionStatus};
pub use user_details::{IdentityAdapter, IdentityError, InMemoryUserRepository, UserRepository};

mod extractor;

pub mod access;
pub mod ant_matcher;
pub mod authenticator;
pub mod concurrent;
pub mod config;
pub mod crypto;
pub mod events;
pub mod firewall;
pub mod form_login;
pub mod identity;
pub mod middleware;
pub mod session;
pub mod session_manager;
pub mod user_details;
