//! Security configuration: decision strategy, role hierarchy and global access control

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::sync::Arc;

use crate::security::{
    AccessControl, AccessControlRule, AccessDecisionManager, AuthenticatedVoter, DecisionStrategy,
    GlobalSecurity, RoleHierarchy, RoleVoter, RuleKind, SecurityResult, Voter, PUBLIC_ACCESS,
};

/// Prefix of the attributes the configured role voter decides on
pub const ROLE_PREFIX: &str = "ROLE_";

/// One `[[security.access_control]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlRuleConfig {
    pub kind: RuleKind,
    pub path: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// `affirmative`, `consensus` or `unanimous`
    pub strategy: String,
    pub role_hierarchy: BTreeMap<String, Vec<String>>,
    pub access_control: Vec<AccessControlRuleConfig>,
    pub public_attribute: String,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            strategy: DecisionStrategy::default().as_str().to_string(),
            role_hierarchy: BTreeMap::new(),
            access_control: Vec::new(),
            public_attribute: PUBLIC_ACCESS.to_string(),
        }
    }
}

impl SecuritySettings {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(strategy) = env::var("PORTCULLIS_DECISION_STRATEGY") {
            self.strategy = strategy;
        }
        if let Ok(attribute) = env::var("PORTCULLIS_PUBLIC_ATTRIBUTE") {
            self.public_attribute = attribute;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.decision_strategy().context("invalid security.strategy")?;
        self.access_control().context("invalid security.access_control")?;
        if self.public_attribute.trim().is_empty() {
            anyhow::bail!("security.public_attribute may not be empty");
        }
        Ok(())
    }

    pub fn decision_strategy(&self) -> SecurityResult<DecisionStrategy> {
        self.strategy.parse()
    }

    /// Rules in declaration order
    pub fn access_control(&self) -> SecurityResult<AccessControl> {
        let rules = self
            .access_control
            .iter()
            .map(|rule| AccessControlRule::of_kind(rule.kind, &rule.path, &rule.attributes))
            .collect::<SecurityResult<Vec<_>>>()?;
        Ok(AccessControl::new(rules))
    }

    pub fn role_hierarchy(&self) -> RoleHierarchy {
        let implied: HashMap<String, Vec<String>> =
            self.role_hierarchy.iter().map(|(role, implies)| (role.clone(), implies.clone())).collect();
        RoleHierarchy::new(implied)
    }

    /// Decision manager with a `ROLE_` [`RoleVoter`] and an [`AuthenticatedVoter`]
    pub fn access_decision_manager(&self) -> SecurityResult<AccessDecisionManager> {
        let voters: Vec<Arc<dyn Voter>> =
            vec![Arc::new(RoleVoter::with_prefix(ROLE_PREFIX)), Arc::new(AuthenticatedVoter)];
        Ok(AccessDecisionManager::new(self.decision_strategy()?, voters))
    }

    /// Global section for a [`SecurityBuilder`](crate::security::SecurityBuilder)
    pub fn global_security(&self) -> SecurityResult<GlobalSecurity> {
        let mut global = GlobalSecurity::new()
            .with_access_control(self.access_control()?)
            .with_access_decision_manager(self.access_decision_manager()?);
        if !self.role_hierarchy.is_empty() {
            global = global.with_role_hierarchy(self.role_hierarchy());
        }
        Ok(global)
    }
}
