//! Route pattern syntax
//!
//! A pattern is a `/`-separated list of segments:
//!
//! - `users` matches the literal segment
//! - `:id` binds one segment, `:id?` may be omitted at the end of the path
//! - `*name` binds one segment, or the rest of the path when it is last
//! - `*name...` always binds the rest of the path, possibly empty

use std::fmt;

/// One parsed segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param { name: String, optional: bool },
    Wildcard { name: String, catch_all: bool },
}

impl Segment {
    /// Parse a raw segment; `is_last` turns a trailing `*name` into a catch-all
    pub fn parse(raw: &str, is_last: bool) -> Self {
        if let Some(rest) = raw.strip_prefix(':') {
            match rest.strip_suffix('?') {
                Some(name) => Segment::Param { name: name.to_string(), optional: true },
                None => Segment::Param { name: rest.to_string(), optional: false },
            }
        } else if let Some(rest) = raw.strip_prefix('*') {
            match rest.strip_suffix("...") {
                Some(name) => Segment::Wildcard { name: name.to_string(), catch_all: true },
                None => Segment::Wildcard { name: rest.to_string(), catch_all: is_last },
            }
        } else {
            Segment::Static(raw.to_string())
        }
    }

    /// Name bound by this segment, `None` for literals
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param { name, .. } | Segment::Wildcard { name, .. } => Some(name),
        }
    }

    pub fn is_optional_param(&self) -> bool {
        matches!(self, Segment::Param { optional: true, .. })
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::Wildcard { catch_all: true, .. })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(value) => write!(f, "{}", value),
            Segment::Param { name, optional: false } => write!(f, ":{}", name),
            Segment::Param { name, optional: true } => write!(f, ":{}?", name),
            Segment::Wildcard { name, catch_all: true } => write!(f, "*{}...", name),
            Segment::Wildcard { name, catch_all: false } => write!(f, "*{}", name),
        }
    }
}

/// Canonical form of a path or pattern: trimmed, leading `/`, no trailing `/` except root
pub fn normalize_path(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Segments of a normalized path; the root path is a single empty segment
pub fn split_segments(normalized: &str) -> Vec<&str> {
    normalized.strip_prefix('/').unwrap_or(normalized).split('/').collect()
}

/// Parse a raw pattern into its normalized text and segments
pub fn parse_pattern(pattern: &str) -> (String, Vec<Segment>) {
    let normalized = normalize_path(pattern);
    let raw = split_segments(&normalized);
    let last = raw.len().saturating_sub(1);
    let segments = raw.iter().enumerate().map(|(i, s)| Segment::parse(s, i == last)).collect();
    (normalized, segments)
}

/// Join a group prefix and a route pattern with exactly one `/` between them
pub fn join_paths(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim().trim_end_matches('/');
    let pattern = pattern.trim().trim_start_matches('/');
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", pattern),
        (false, true) => normalize_path(prefix),
        (false, false) => normalize_path(&format!("{}/{}", prefix, pattern)),
    }
}

/// Whether a route could end right before `remaining` without consuming more path
pub(crate) fn may_end_here(remaining: &[Segment]) -> bool {
    for segment in remaining {
        match segment {
            Segment::Param { optional: true, .. } => continue,
            Segment::Param { optional: false, .. } => return false,
            Segment::Wildcard { catch_all, .. } => return *catch_all,
            Segment::Static(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("  "), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("users/"), "/users");
        assert_eq!(normalize_path(" /users/42/ "), "/users/42");
        assert_eq!(normalize_path("/health//"), "/health");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_pattern_with_repeated_trailing_slashes() {
        let (normalized, segments) = parse_pattern("/a//");
        assert_eq!(normalized, "/a");
        assert_eq!(segments, vec![Segment::Static("a".into())]);
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("/"), vec![""]);
        assert_eq!(split_segments("/a/b"), vec!["a", "b"]);
    }

    #[test]
    fn test_segment_parsing() {
        assert_eq!(Segment::parse("users", false), Segment::Static("users".into()));
        assert_eq!(
            Segment::parse(":slug?", true),
            Segment::Param { name: "slug".into(), optional: true }
        );
        assert_eq!(
            Segment::parse("*path", false),
            Segment::Wildcard { name: "path".into(), catch_all: false }
        );
        assert_eq!(
            Segment::parse("*path", true),
            Segment::Wildcard { name: "path".into(), catch_all: true }
        );
        assert_eq!(
            Segment::parse("*path...", false),
            Segment::Wildcard { name: "path".into(), catch_all: true }
        );
    }

    #[test]
    fn test_parse_pattern_round_trips_display() {
        let (normalized, segments) = parse_pattern("/files/:id?/*rest...");
        assert_eq!(normalized, "/files/:id?/*rest...");
        let rendered: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        assert_eq!(rendered, vec!["files", ":id?", "*rest..."]);
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api/", "/users"), "/api/users");
        assert_eq!(join_paths("/api", ""), "/api");
        assert_eq!(join_paths("", "users"), "/users");
        assert_eq!(join_paths("", ""), "/");
    }

    #[test]
    fn test_may_end_here() {
        let (_, segments) = parse_pattern("/:a?/:b?");
        assert!(may_end_here(&segments));
        let (_, segments) = parse_pattern("/:a?/:b");
        assert!(!may_end_here(&segments));
        let (_, segments) = parse_pattern("/:a?/*rest");
        assert!(may_end_here(&segments));
        let (_, segments) = parse_pattern("/*one/static");
        assert!(!may_end_here(&segments));
        assert!(may_end_here(&[]));
    }
}
