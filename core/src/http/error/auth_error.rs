use actix_web::{error, http::StatusCode, HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error};

use crate::http::security::session::SessionError;

/// Reasons an authentication or authorization attempt is refused.
///
/// # Spring Equivalent
/// `AuthenticationException` subclasses and `AccessDeniedException`
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationError {
    #[display("user not found")]
    UserNotFound,
    #[display("bad credentials")]
    BadCredentials,
    #[display("account disabled")]
    AccountDisabled,
    #[display("account locked")]
    AccountLocked,
    #[display("account expired")]
    AccountExpired,
    #[display("credentials expired")]
    CredentialsExpired,
    #[display("session expired")]
    SessionExpired,
    #[display("maximum sessions exceeded")]
    SessionCapExceeded,
    #[display("forbidden")]
    Forbidden,
    #[display("unauthorized")]
    Unauthorized,
}

impl AuthenticationError {
    /// Message safe to show to the end user.
    ///
    /// Unknown usernames and wrong passwords share one message so the
    /// login form cannot be used to enumerate accounts.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthenticationError::UserNotFound | AuthenticationError::BadCredentials => {
                "Invalid username or password"
            }
            AuthenticationError::AccountDisabled
            | AuthenticationError::AccountLocked
            | AuthenticationError::AccountExpired
            | AuthenticationError::CredentialsExpired => "Account is not available",
            AuthenticationError::SessionExpired => "Your session has expired",
            AuthenticationError::SessionCapExceeded => "Maximum sessions for this user exceeded",
            AuthenticationError::Forbidden => "Access is denied",
            AuthenticationError::Unauthorized => "Authentication required",
        }
    }

    /// True for failures that happen while checking submitted credentials.
    pub fn is_credentials_failure(&self) -> bool {
        matches!(
            self,
            AuthenticationError::UserNotFound | AuthenticationError::BadCredentials
        )
    }
}

impl error::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthenticationError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code()).body(self.user_message())
    }
}

/// Outcome of a failed login attempt.
#[derive(Debug)]
pub enum LoginError {
    /// The attempt was refused (credentials, account status, session cap)
    Rejected(AuthenticationError),
    /// A collaborator (user repository, session store) failed
    Storage(String),
}

impl LoginError {
    /// Returns the refusal reason, if the attempt was refused.
    pub fn reason(&self) -> Option<AuthenticationError> {
        match self {
            LoginError::Rejected(reason) => Some(*reason),
            LoginError::Storage(_) => None,
        }
    }
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::Rejected(reason) => write!(f, "Login rejected: {}", reason),
            LoginError::Storage(e) => write!(f, "Login storage error: {}", e),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<AuthenticationError> for LoginError {
    fn from(reason: AuthenticationError) -> Self {
        LoginError::Rejected(reason)
    }
}

impl From<SessionError> for LoginError {
    fn from(e: SessionError) -> Self {
        LoginError::Storage(e.to_string())
    }
}
