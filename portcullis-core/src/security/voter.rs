//! Voters: per-attribute access opinions
//!
//! A voter first declares whether it has an opinion on an attribute at all
//! (`supports`), then votes grant, deny or abstain.

use std::any::Any;
use std::sync::Arc;

use super::role_hierarchy::RoleHierarchy;
use super::token::Token;

/// Attribute granted to any authenticated token by [`AuthenticatedVoter`]
pub const IS_AUTHENTICATED: &str = "IS_AUTHENTICATED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResult {
    Granted,
    Denied,
    Abstain,
}

/// Optional subject of a decision, typically the request being authorized
pub type Subject<'a> = Option<&'a dyn Any>;

pub trait Voter: Send + Sync {
    fn supports(&self, attribute: &str, subject: Subject<'_>) -> bool;

    fn vote(&self, token: &Token, attribute: &str, subject: Subject<'_>) -> VoteResult;

    /// Plain role voters can be upgraded to hierarchy-aware ones at compile time
    fn as_role_voter(&self) -> Option<&RoleVoter> {
        None
    }
}

/// Grants when the token carries the attribute as a role
///
/// With a prefix (for instance `ROLE_`) the voter only supports attributes
/// that start with it, leaving other attributes to other voters.
#[derive(Debug, Clone, Default)]
pub struct RoleVoter {
    prefix: Option<String>,
}

impl RoleVoter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self { prefix: Some(prefix.to_string()) }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn vote_on_roles(&self, roles: &[String], attribute: &str) -> VoteResult {
        if attribute.is_empty() {
            return VoteResult::Abstain;
        }
        if roles.iter().any(|role| role == attribute) {
            VoteResult::Granted
        } else {
            VoteResult::Denied
        }
    }
}

impl Voter for RoleVoter {
    fn supports(&self, attribute: &str, _subject: Subject<'_>) -> bool {
        match &self.prefix {
            Some(prefix) => attribute.starts_with(prefix.as_str()),
            None => true,
        }
    }

    fn vote(&self, token: &Token, attribute: &str, _subject: Subject<'_>) -> VoteResult {
        self.vote_on_roles(token.roles(), attribute)
    }

    fn as_role_voter(&self) -> Option<&RoleVoter> {
        Some(self)
    }
}

/// Role voter that expands the token's roles through a hierarchy first
#[derive(Debug, Clone)]
pub struct RoleHierarchyVoter {
    hierarchy: Arc<RoleHierarchy>,
    delegate: RoleVoter,
}

impl RoleHierarchyVoter {
    pub fn new(hierarchy: Arc<RoleHierarchy>) -> Self {
        Self { hierarchy, delegate: RoleVoter::new() }
    }

    pub fn with_delegate(hierarchy: Arc<RoleHierarchy>, delegate: RoleVoter) -> Self {
        Self { hierarchy, delegate }
    }
}

impl Voter for RoleHierarchyVoter {
    fn supports(&self, attribute: &str, subject: Subject<'_>) -> bool {
        self.delegate.supports(attribute, subject)
    }

    fn vote(&self, token: &Token, attribute: &str, _subject: Subject<'_>) -> VoteResult {
        let expanded = self.hierarchy.expand_roles(token.roles());
        self.delegate.vote_on_roles(&expanded, attribute)
    }
}

/// Votes on [`IS_AUTHENTICATED`] only
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedVoter;

impl Voter for AuthenticatedVoter {
    fn supports(&self, attribute: &str, _subject: Subject<'_>) -> bool {
        attribute == IS_AUTHENTICATED
    }

    fn vote(&self, token: &Token, _attribute: &str, _subject: Subject<'_>) -> VoteResult {
        if token.is_authenticated() {
            VoteResult::Granted
        } else {
            VoteResult::Denied
        }
    }
}
