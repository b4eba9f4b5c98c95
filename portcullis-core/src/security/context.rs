//! Per-request security state

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::access_control::RuleKind;
use super::firewall::CompiledFirewall;
use super::token::Token;

/// Where a compiled firewall component came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    None,
    Global,
    Firewall,
    Merged,
}

/// The access-control rule that governed a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedAccessControlRule {
    pub firewall: Option<String>,
    pub kind: RuleKind,
    pub path_prefix: String,
    pub attributes: Vec<String>,
    pub rule_index: usize,
    pub source: Source,
}

/// Firewall and token resolved for one request
///
/// Built by the resolution listener; the access-control listener records
/// the matched rule on it before handing it to the handler.
#[derive(Clone)]
pub struct SecurityContext {
    firewall: Arc<CompiledFirewall>,
    token: Token,
    matched_rule: Option<MatchedAccessControlRule>,
}

impl SecurityContext {
    pub fn new(firewall: Arc<CompiledFirewall>, token: Token) -> Self {
        Self { firewall, token, matched_rule: None }
    }

    pub fn firewall(&self) -> &Arc<CompiledFirewall> {
        &self.firewall
    }

    pub fn firewall_name(&self) -> &str {
        self.firewall.name()
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn matched_rule(&self) -> Option<&MatchedAccessControlRule> {
        self.matched_rule.as_ref()
    }

    pub(crate) fn set_matched_rule(&mut self, rule: MatchedAccessControlRule) {
        self.matched_rule = Some(rule);
    }

    /// Whether the token holds `role`, directly or through the firewall's hierarchy
    pub fn is_granted(&self, role: &str) -> bool {
        if role.is_empty() {
            return false;
        }
        match self.firewall.role_hierarchy() {
            Some(hierarchy) => hierarchy.expand_roles(self.token.roles()).iter().any(|r| r == role),
            None => self.token.has_role(role),
        }
    }
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("firewall", &self.firewall.name())
            .field("token", &self.token)
            .field("matched_rule", &self.matched_rule)
            .finish()
    }
}
