//! URL access rules.
//!
//! # Spring Security Equivalent
//! `HttpSecurity.authorizeHttpRequests()` and
//! `RequestMatcherDelegatingAuthorizationManager`
//!
//! Rules are tried in declaration order and the first match decides.
//! A path no rule matches is allowed.
//!
//! # Example
//! ```
//! use session_guard_core::http::security::access::{AccessPolicy, Decision};
//!
//! let policy = AccessPolicy::new()
//!     .request_matchers(&["/user/**"]).authenticated()
//!     .request_matchers(&["/manager/**"]).has_any_role(&["ADMIN", "MANAGER"])
//!     .request_matchers(&["/admin/**"]).has_role("ADMIN")
//!     .any_request().permit_all();
//!
//! assert_eq!(policy.evaluate("/user", None), Decision::RedirectToLogin);
//! assert_eq!(policy.evaluate("/public/info", None), Decision::Allow);
//! ```

use std::fmt;
use std::time::Instant;

use regex::Regex;

use crate::http::security::ant_matcher::AntPathMatcher;
use crate::http::security::session::Session;

/// Selects the paths a rule applies to.
#[derive(Debug, Clone)]
pub enum RequestMatcher {
    Ant(AntPathMatcher),
    /// Anchored regular expression
    Regex(Regex),
    Any,
}

impl RequestMatcher {
    pub fn ant(pattern: &str) -> Self {
        RequestMatcher::Ant(AntPathMatcher::new(pattern))
    }

    /// The pattern is anchored at both ends.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})$", pattern)).map(RequestMatcher::Regex)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RequestMatcher::Ant(matcher) => matcher.matches(path),
            RequestMatcher::Regex(regex) => regex.is_match(path),
            RequestMatcher::Any => true,
        }
    }
}

impl fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMatcher::Ant(matcher) => write!(f, "Ant [pattern='{}']", matcher.pattern()),
            RequestMatcher::Regex(regex) => write!(f, "Regex [pattern='{}']", regex.as_str()),
            RequestMatcher::Any => write!(f, "any request"),
        }
    }
}

/// What a matched path demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// # Spring Equivalent
    /// `permitAll()`
    Public,
    /// # Spring Equivalent
    /// `authenticated()`
    Authenticated,
    /// Any one of the roles. Names are stored without the `ROLE_` prefix.
    ///
    /// # Spring Equivalent
    /// `hasRole("X")` / `hasAnyRole("X", "Y")`
    RoleIn(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    matcher: RequestMatcher,
    requirement: Requirement,
}

impl AccessRule {
    pub fn new(matcher: RequestMatcher, requirement: Requirement) -> Self {
        Self {
            matcher,
            requirement,
        }
    }

    pub fn matcher(&self) -> &RequestMatcher {
        &self.matcher
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Authenticated, but missing the role. Answered with 403.
    DenyForbidden,
    /// No valid authenticated session.
    RedirectToLogin,
}

/// Ordered access rule table.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a rule for one or more Ant patterns.
    ///
    /// # Spring Equivalent
    /// `requestMatchers("/admin/**")`
    pub fn request_matchers(self, patterns: &[&str]) -> AuthorizedUrl {
        let matchers = patterns.iter().map(|p| RequestMatcher::ant(p)).collect();
        AuthorizedUrl {
            policy: self,
            matchers,
        }
    }

    /// Starts a rule for prebuilt matchers (regex, case-insensitive Ant).
    pub fn matchers(self, matchers: Vec<RequestMatcher>) -> AuthorizedUrl {
        AuthorizedUrl {
            policy: self,
            matchers,
        }
    }

    /// # Spring Equivalent
    /// `anyRequest()`
    pub fn any_request(self) -> AuthorizedUrl {
        self.matchers(vec![RequestMatcher::Any])
    }

    pub fn add_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Puts rules ahead of every rule declared so far.
    pub fn prepend_rules(mut self, rules: Vec<AccessRule>) -> Self {
        self.rules.splice(0..0, rules);
        self
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// The first rule matching `path`, if any.
    pub fn find_rule(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(path))
    }

    pub fn evaluate(&self, path: &str, session: Option<&Session>) -> Decision {
        self.evaluate_at(path, session, Instant::now())
    }

    /// Decides access for `path`. Pure: nothing is recorded.
    pub fn evaluate_at(&self, path: &str, session: Option<&Session>, now: Instant) -> Decision {
        let rule = match self.find_rule(path) {
            Some(rule) => rule,
            None => return Decision::Allow,
        };

        let principal = session
            .filter(|s| !s.is_expired(now))
            .and_then(|s| s.get_principal());

        match (&rule.requirement, principal) {
            (Requirement::Public, _) => Decision::Allow,
            (_, None) => Decision::RedirectToLogin,
            (Requirement::Authenticated, Some(_)) => Decision::Allow,
            (Requirement::RoleIn(roles), Some(principal)) => {
                if principal.has_any_role(roles.as_slice()) {
                    Decision::Allow
                } else {
                    Decision::DenyForbidden
                }
            }
        }
    }
}

/// A rule under construction. Finished by choosing its requirement.
///
/// # Spring Equivalent
/// `AuthorizeHttpRequestsConfigurer.AuthorizedUrl`
pub struct AuthorizedUrl {
    policy: AccessPolicy,
    matchers: Vec<RequestMatcher>,
}

impl AuthorizedUrl {
    pub fn permit_all(self) -> AccessPolicy {
        self.finish(Requirement::Public)
    }

    pub fn authenticated(self) -> AccessPolicy {
        self.finish(Requirement::Authenticated)
    }

    /// `ADMIN` and `ROLE_ADMIN` are equivalent.
    pub fn has_role(self, role: &str) -> AccessPolicy {
        self.has_any_role(&[role])
    }

    pub fn has_any_role(self, roles: &[&str]) -> AccessPolicy {
        let roles = roles.iter().map(|r| normalize_role(r)).collect();
        self.finish(Requirement::RoleIn(roles))
    }

    fn finish(self, requirement: Requirement) -> AccessPolicy {
        let AuthorizedUrl {
            mut policy,
            matchers,
        } = self;
        for matcher in matchers {
            policy.rules.push(AccessRule::new(matcher, requirement.clone()));
        }
        policy
    }
}

fn normalize_role(role: &str) -> String {
    role.strip_prefix(crate::http::security::identity::ROLE_PREFIX)
        .unwrap_or(role)
        .to_string()
}
