//! # Session Guard
//!
//! Spring Security-style form login and URL authorization for Actix Web,
//! backed by a server-side session store with fixation protection and
//! concurrent session control.
//!
//! - [`http::security`] - Access rules, identity adapter, sessions, middleware
//! - [`http::error`] - Error types

pub mod http;
