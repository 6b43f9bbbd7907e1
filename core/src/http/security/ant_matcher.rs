//! Ant-style path patterns.
//!
//! - `?` matches one character
//! - `*` matches zero or more characters inside one path segment
//! - `**` matches zero or more whole segments
//! - `{name}` matches exactly one segment
//!
//! ```rust
//! use session_guard_core::http::security::ant_matcher::AntPathMatcher;
//!
//! let matcher = AntPathMatcher::new("/admin/**");
//! assert!(matcher.matches("/admin"));
//! assert!(matcher.matches("/admin/users/42"));
//! assert!(!matcher.matches("/administrator"));
//! ```
//!
//! # Spring Equivalent
//! `org.springframework.security.web.util.matcher.AntPathRequestMatcher`

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Exact(String),
    /// `*`, `{var}`
    AnySegment,
    /// `**`
    AnyDepth,
    /// A segment mixing literals with `*` / `?`
    Glob(Vec<char>),
}

/// Compiled Ant-style path pattern.
#[derive(Debug, Clone)]
pub struct AntPathMatcher {
    pattern: String,
    segments: Vec<Segment>,
    case_sensitive: bool,
}

impl AntPathMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            segments: compile(pattern, true),
            case_sensitive: true,
        }
    }

    /// Compare literals without regard to ASCII case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self.segments = compile(&self.pattern, false);
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Trailing and duplicate slashes in `path` are ignored.
    pub fn matches(&self, path: &str) -> bool {
        let normalized;
        let path = if self.case_sensitive {
            path
        } else {
            normalized = path.to_lowercase();
            &normalized
        };
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

impl fmt::Display for AntPathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn compile(pattern: &str, case_sensitive: bool) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|part| {
            let part = if case_sensitive {
                part.to_string()
            } else {
                part.to_lowercase()
            };
            if part == "**" {
                Segment::AnyDepth
            } else if part == "*" || (part.starts_with('{') && part.ends_with('}')) {
                Segment::AnySegment
            } else if part.contains(['*', '?']) {
                Segment::Glob(part.chars().collect())
            } else {
                Segment::Exact(part)
            }
        })
        .collect()
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match (pattern.split_first(), path.split_first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some((Segment::AnyDepth, rest)), _) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        (Some(_), None) => false,
        (Some((Segment::Exact(literal), rest)), Some((part, remaining))) => {
            literal == part && match_segments(rest, remaining)
        }
        (Some((Segment::AnySegment, rest)), Some((_, remaining))) => {
            match_segments(rest, remaining)
        }
        (Some((Segment::Glob(glob), rest)), Some((part, remaining))) => {
            let text: Vec<char> = part.chars().collect();
            match_glob(glob, &text) && match_segments(rest, remaining)
        }
    }
}

fn match_glob(glob: &[char], text: &[char]) -> bool {
    match glob.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| match_glob(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && match_glob(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && match_glob(rest, &text[1..]),
    }
}
