//! Error types surfaced at the request boundary.

pub use auth_error::{AuthenticationError, LoginError};

mod auth_error;
