//! Path-based access control lists
//!
//! Rules map request paths to required attributes. Resolution order is fixed:
//! exact rules, then the longest prefix or segment-prefix rule, then the first
//! matching regex rule, then the first empty-prefix fallback.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{SecurityError, SecurityResult};

/// Discriminant of an [`AccessControlRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Exact,
    Prefix,
    SegmentPrefix,
    Regex,
}

/// A single access-control rule
#[derive(Debug, Clone)]
pub enum AccessControlRule {
    /// Matches one normalized path
    Exact { path: String, attributes: Vec<String> },
    /// Raw string prefix; an empty prefix is the fallback rule
    Prefix { path_prefix: String, attributes: Vec<String> },
    /// Prefix that must end on a segment boundary
    SegmentPrefix { path_prefix: String, attributes: Vec<String> },
    /// Unanchored regex over the normalized path
    Regex { pattern: String, regex: Regex, attributes: Vec<String> },
}

impl AccessControlRule {
    pub fn exact<I, S>(path: &str, attributes: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = path.trim();
        if path.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "exact access control rule requires a path".to_string(),
            ));
        }
        Ok(AccessControlRule::Exact {
            path: strip_trailing_slash(path),
            attributes: normalize_attributes(attributes),
        })
    }

    pub fn prefix<I, S>(path_prefix: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AccessControlRule::Prefix {
            path_prefix: strip_trailing_slash(path_prefix.trim()),
            attributes: normalize_attributes(attributes),
        }
    }

    pub fn segment_prefix<I, S>(path_prefix: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AccessControlRule::SegmentPrefix {
            path_prefix: strip_trailing_slash(path_prefix.trim()),
            attributes: normalize_attributes(attributes),
        }
    }

    pub fn regex<I, S>(pattern: &str, attributes: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "regex access control rule requires a pattern".to_string(),
            ));
        }
        let regex = Regex::new(pattern).map_err(|e| SecurityError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(AccessControlRule::Regex {
            pattern: pattern.to_string(),
            regex,
            attributes: normalize_attributes(attributes),
        })
    }

    /// Build a rule of the given kind from its textual form
    pub fn of_kind<I, S>(kind: RuleKind, path: &str, attributes: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match kind {
            RuleKind::Exact => Self::exact(path, attributes),
            RuleKind::Prefix => Ok(Self::prefix(path, attributes)),
            RuleKind::SegmentPrefix => Ok(Self::segment_prefix(path, attributes)),
            RuleKind::Regex => Self::regex(path, attributes),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            AccessControlRule::Exact { .. } => RuleKind::Exact,
            AccessControlRule::Prefix { .. } => RuleKind::Prefix,
            AccessControlRule::SegmentPrefix { .. } => RuleKind::SegmentPrefix,
            AccessControlRule::Regex { .. } => RuleKind::Regex,
        }
    }

    /// Path, prefix or regex source of the rule
    pub fn path_prefix(&self) -> &str {
        match self {
            AccessControlRule::Exact { path, .. } => path,
            AccessControlRule::Prefix { path_prefix, .. }
            | AccessControlRule::SegmentPrefix { path_prefix, .. } => path_prefix,
            AccessControlRule::Regex { pattern, .. } => pattern,
        }
    }

    pub fn attributes(&self) -> &[String] {
        match self {
            AccessControlRule::Exact { attributes, .. }
            | AccessControlRule::Prefix { attributes, .. }
            | AccessControlRule::SegmentPrefix { attributes, .. }
            | AccessControlRule::Regex { attributes, .. } => attributes,
        }
    }

    fn is_fallback(&self) -> bool {
        matches!(
            self,
            AccessControlRule::Prefix { path_prefix, .. }
                | AccessControlRule::SegmentPrefix { path_prefix, .. } if path_prefix.is_empty()
        )
    }

    /// Length of the matched prefix, for prefix-style rules that match `path`
    fn prefix_match_len(&self, path: &str) -> Option<usize> {
        match self {
            AccessControlRule::Prefix { path_prefix, .. } if !path_prefix.is_empty() => {
                path.starts_with(path_prefix.as_str()).then_some(path_prefix.len())
            }
            AccessControlRule::SegmentPrefix { path_prefix, .. } if !path_prefix.is_empty() => {
                if path_prefix == "/" {
                    return Some(1);
                }
                let rest = path.strip_prefix(path_prefix.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then_some(path_prefix.len())
            }
            _ => None,
        }
    }
}

/// Result of matching a path against an [`AccessControl`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlMatch {
    pub rule_index: usize,
    pub kind: RuleKind,
    pub path_prefix: String,
    pub attributes: Vec<String>,
}

/// Ordered list of access-control rules
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    rules: Vec<AccessControlRule>,
}

impl AccessControl {
    pub fn new(rules: Vec<AccessControlRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: AccessControlRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Copy of the configured rules
    pub fn rules(&self) -> Vec<AccessControlRule> {
        self.rules.clone()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Concatenate two lists, `first` taking precedence on ties
    pub fn merged(first: &AccessControl, second: &AccessControl) -> Self {
        let mut rules = first.rules.clone();
        rules.extend(second.rules.iter().cloned());
        Self { rules }
    }

    /// Resolve the rule governing `path`; attributes in the result are copies
    pub fn match_path(&self, path: &str) -> Option<AccessControlMatch> {
        let path = normalize_request_path(path);
        self.find(&path).map(|index| {
            let rule = &self.rules[index];
            AccessControlMatch {
                rule_index: index,
                kind: rule.kind(),
                path_prefix: rule.path_prefix().to_string(),
                attributes: rule.attributes().to_vec(),
            }
        })
    }

    fn find(&self, path: &str) -> Option<usize> {
        let exact = self.rules.iter().position(|rule| {
            matches!(rule, AccessControlRule::Exact { path: exact, .. } if exact == path)
        });
        if exact.is_some() {
            return exact;
        }

        let mut longest: Option<(usize, usize)> = None;
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(len) = rule.prefix_match_len(path) {
                if longest.map_or(true, |(_, best)| best < len) {
                    longest = Some((index, len));
                }
            }
        }
        if let Some((index, _)) = longest {
            return Some(index);
        }

        let regex = self.rules.iter().position(|rule| {
            matches!(rule, AccessControlRule::Regex { regex, .. } if regex.is_match(path))
        });
        if regex.is_some() {
            return regex;
        }

        self.rules.iter().position(AccessControlRule::is_fallback)
    }
}

fn strip_trailing_slash(path: &str) -> String {
    match path.trim_end_matches('/') {
        "" if !path.is_empty() => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn normalize_request_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return "/".to_string();
    }
    strip_trailing_slash(path)
}

fn normalize_attributes<I, S>(attributes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    attributes
        .into_iter()
        .map(|a| a.as_ref().trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}
