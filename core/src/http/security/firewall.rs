//! Request path checks run before any rule is evaluated.
//!
//! # Spring Security Equivalent
//! `StrictHttpFirewall`
//!
//! Rules are evaluated against the path the router matches. Paths that
//! could still be read two ways (empty or dot segments, an encoded slash,
//! backslash or percent) are rejected instead of normalized.

/// Why `path` is refused, or `None` when it is safe to authorize.
pub fn reject_reason(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        return Some("path is not absolute");
    }
    let lower = path.to_ascii_lowercase();
    if lower.contains("%2f") {
        return Some("encoded slash");
    }
    if lower.contains("%5c") || path.contains('\\') {
        return Some("backslash");
    }
    if lower.contains("%25") {
        return Some("encoded percent");
    }
    if lower.contains("%2e") {
        return Some("encoded period");
    }
    if path.contains(';') {
        return Some("semicolon");
    }

    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            // Leading slash and one trailing slash
            "" if i == 0 || i == last => {}
            "" => return Some("empty path segment"),
            "." | ".." => return Some("dot path segment"),
            _ => {}
        }
    }
    None
}

/// True for a same-origin path that is safe to redirect to.
pub fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}
