//! Declarative security configuration and its compilation
//!
//! A [`SecurityBuilder`] collects one optional global section and any number
//! of firewall definitions. [`SecurityBuilder::compile`] validates them and
//! folds global settings into each firewall:
//!
//! - role hierarchy, decision manager, entry point and access-denied handler
//!   come from the firewall override when set, else from the global section
//! - plain role voters become hierarchy-aware when a hierarchy is in effect
//! - access control is local only, or local merged with global, depending on
//!   the override's merge strategy

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::access_control::AccessControl;
use super::context::Source;
use super::contract::{
    AccessDeniedHandler, EntryPoint, LoginHandler, LogoutHandler, RequestMatcher, Rule, TokenSource,
};
use super::decision::AccessDecisionManager;
use super::error::{SecurityError, SecurityResult};
use super::firewall::{CompiledConfiguration, CompiledFirewall, ComponentSources};
use super::role_hierarchy::RoleHierarchy;
use super::voter::{RoleHierarchyVoter, Voter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessControlMergeStrategy {
    /// Firewall rules first, then global rules
    #[default]
    LocalFirst,
    /// Global rules first, then firewall rules
    GlobalFirst,
    /// Firewall rules only, global rules are never inherited
    OverrideOnly,
}

/// Settings shared by every firewall unless overridden
#[derive(Clone, Default)]
pub struct GlobalSecurity {
    access_control: Option<AccessControl>,
    role_hierarchy: Option<Arc<RoleHierarchy>>,
    access_decision_manager: Option<AccessDecisionManager>,
    entry_point: Option<Arc<dyn EntryPoint>>,
    access_denied_handler: Option<Arc<dyn AccessDeniedHandler>>,
}

impl GlobalSecurity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_control(mut self, access_control: AccessControl) -> Self {
        self.access_control = Some(access_control);
        self
    }

    pub fn with_role_hierarchy(mut self, hierarchy: RoleHierarchy) -> Self {
        self.role_hierarchy = Some(Arc::new(hierarchy));
        self
    }

    pub fn with_access_decision_manager(mut self, manager: AccessDecisionManager) -> Self {
        self.access_decision_manager = Some(manager);
        self
    }

    pub fn with_entry_point(mut self, entry_point: Arc<dyn EntryPoint>) -> Self {
        self.entry_point = Some(entry_point);
        self
    }

    pub fn with_access_denied_handler(mut self, handler: Arc<dyn AccessDeniedHandler>) -> Self {
        self.access_denied_handler = Some(handler);
        self
    }
}

/// Per-firewall overrides of the global settings
#[derive(Clone)]
pub struct FirewallOverride {
    stateless: bool,
    inherit_global_access_control: bool,
    merge_strategy: AccessControlMergeStrategy,
    access_control: Option<AccessControl>,
    role_hierarchy: Option<Arc<RoleHierarchy>>,
    access_decision_manager: Option<AccessDecisionManager>,
    entry_point: Option<Arc<dyn EntryPoint>>,
    access_denied_handler: Option<Arc<dyn AccessDeniedHandler>>,
}

impl Default for FirewallOverride {
    fn default() -> Self {
        Self {
            stateless: false,
            inherit_global_access_control: true,
            merge_strategy: AccessControlMergeStrategy::LocalFirst,
            access_control: None,
            role_hierarchy: None,
            access_decision_manager: None,
            entry_point: None,
            access_denied_handler: None,
        }
    }
}

impl FirewallOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inherit_global_access_control(mut self, inherit: bool) -> Self {
        self.inherit_global_access_control = inherit;
        self
    }

    pub fn with_merge_strategy(mut self, strategy: AccessControlMergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn with_access_control(mut self, access_control: AccessControl) -> Self {
        self.access_control = Some(access_control);
        self
    }

    pub fn with_role_hierarchy(mut self, hierarchy: RoleHierarchy) -> Self {
        self.role_hierarchy = Some(Arc::new(hierarchy));
        self
    }

    pub fn with_access_decision_manager(mut self, manager: AccessDecisionManager) -> Self {
        self.access_decision_manager = Some(manager);
        self
    }

    pub fn with_entry_point(mut self, entry_point: Arc<dyn EntryPoint>) -> Self {
        self.entry_point = Some(entry_point);
        self
    }

    pub fn with_access_denied_handler(mut self, handler: Arc<dyn AccessDeniedHandler>) -> Self {
        self.access_denied_handler = Some(handler);
        self
    }
}

/// One firewall as declared, before compilation
///
/// Firewalls are stateful by default and then need login and logout
/// configuration; [`FirewallDefinition::stateless`] drops that requirement.
#[derive(Clone)]
pub struct FirewallDefinition {
    name: String,
    matcher: Arc<dyn RequestMatcher>,
    rules: Vec<Arc<dyn Rule>>,
    token_source: Arc<dyn TokenSource>,
    login_path: Option<String>,
    logout_path: Option<String>,
    login_handler: Option<Arc<dyn LoginHandler>>,
    logout_handler: Option<Arc<dyn LogoutHandler>>,
    overrides: FirewallOverride,
}

impl FirewallDefinition {
    pub fn new(name: &str, matcher: Arc<dyn RequestMatcher>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            name: name.trim().to_string(),
            matcher,
            rules: Vec::new(),
            token_source,
            login_path: None,
            logout_path: None,
            login_handler: None,
            logout_handler: None,
            overrides: FirewallOverride::default(),
        }
    }

    pub fn stateless(mut self) -> Self {
        self.overrides.stateless = true;
        self
    }

    pub fn with_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_login(mut self, path: &str, handler: Arc<dyn LoginHandler>) -> Self {
        self.login_path = Some(path.trim().to_string());
        self.login_handler = Some(handler);
        self
    }

    pub fn with_logout(mut self, path: &str, handler: Arc<dyn LogoutHandler>) -> Self {
        self.logout_path = Some(path.trim().to_string());
        self.logout_handler = Some(handler);
        self
    }

    /// Replace the overrides, keeping the stateless flag of this definition
    pub fn with_override(mut self, mut overrides: FirewallOverride) -> Self {
        overrides.stateless = self.overrides.stateless;
        self.overrides = overrides;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> SecurityResult<()> {
        if self.name.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "security firewall name may not be empty".to_string(),
            ));
        }

        let has_login_path = self.login_path.as_deref().is_some_and(|p| !p.is_empty());
        let has_logout_path = self.logout_path.as_deref().is_some_and(|p| !p.is_empty());

        if self.overrides.stateless {
            if has_login_path
                || has_logout_path
                || self.login_handler.is_some()
                || self.logout_handler.is_some()
            {
                return Err(SecurityError::InvalidConfiguration(format!(
                    "stateless firewall '{}' may not define login or logout configuration",
                    self.name
                )));
            }
            return Ok(());
        }

        if !has_login_path || self.login_handler.is_none() {
            return Err(SecurityError::InvalidConfiguration(format!(
                "firewall '{}' requires a login path and handler",
                self.name
            )));
        }
        if !has_logout_path || self.logout_handler.is_none() {
            return Err(SecurityError::InvalidConfiguration(format!(
                "firewall '{}' requires a logout path and handler",
                self.name
            )));
        }
        Ok(())
    }
}

/// Collects the global section and firewall definitions
#[derive(Default)]
pub struct SecurityBuilder {
    global: GlobalSecurity,
    global_defined: bool,
    global_defined_twice: bool,
    firewalls: Vec<FirewallDefinition>,
}

impl SecurityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global section; defining it twice fails at compile time
    pub fn with_global(mut self, global: GlobalSecurity) -> Self {
        if self.global_defined {
            self.global_defined_twice = true;
        }
        self.global_defined = true;
        self.global = global;
        self
    }

    pub fn with_firewall(mut self, firewall: FirewallDefinition) -> Self {
        self.firewalls.push(firewall);
        self
    }

    pub fn compile(self) -> SecurityResult<CompiledConfiguration> {
        if self.global_defined_twice {
            return Err(SecurityError::InvalidConfiguration(
                "security global configuration may only be defined once".to_string(),
            ));
        }

        let mut compiled = Vec::with_capacity(self.firewalls.len());
        for definition in self.firewalls {
            definition.validate()?;
            let firewall = compile_firewall(&self.global, definition);
            log::info!(
                "Compiled firewall '{}' (stateless={}, access_control={:?} with {} rules)",
                firewall.name,
                firewall.stateless,
                firewall.sources.access_control,
                firewall.access_control.len()
            );
            compiled.push(Arc::new(firewall));
        }

        Ok(CompiledConfiguration {
            firewalls: compiled,
            global_access_control: self.global.access_control,
        })
    }
}

/// Pick the firewall's own component, else the global one, recording where it came from
fn inherit<T: Clone>(local: &Option<T>, global: &Option<T>) -> (Option<T>, Source) {
    match (local, global) {
        (Some(local), _) => (Some(local.clone()), Source::Firewall),
        (None, Some(global)) => (Some(global.clone()), Source::Global),
        (None, None) => (None, Source::None),
    }
}

fn upgrade_role_voters(manager: &AccessDecisionManager, hierarchy: &Arc<RoleHierarchy>) -> AccessDecisionManager {
    let mut upgraded = false;
    let voters: Vec<Arc<dyn Voter>> = manager
        .voters()
        .into_iter()
        .map(|voter| match voter.as_role_voter() {
            Some(role_voter) => {
                upgraded = true;
                Arc::new(RoleHierarchyVoter::with_delegate(Arc::clone(hierarchy), role_voter.clone()))
                    as Arc<dyn Voter>
            }
            None => voter,
        })
        .collect();

    if upgraded {
        AccessDecisionManager::new(manager.strategy(), voters)
    } else {
        manager.clone()
    }
}

fn compile_firewall(global: &GlobalSecurity, definition: FirewallDefinition) -> CompiledFirewall {
    let overrides = &definition.overrides;

    let (role_hierarchy, role_hierarchy_source) =
        inherit(&overrides.role_hierarchy, &global.role_hierarchy);
    let (mut decision_manager, decision_manager_source) =
        inherit(&overrides.access_decision_manager, &global.access_decision_manager);
    if let (Some(hierarchy), Some(manager)) = (&role_hierarchy, &decision_manager) {
        decision_manager = Some(upgrade_role_voters(manager, hierarchy));
    }
    let (entry_point, entry_point_source) = inherit(&overrides.entry_point, &global.entry_point);
    let (access_denied_handler, access_denied_handler_source) =
        inherit(&overrides.access_denied_handler, &global.access_denied_handler);

    let local = overrides.access_control.clone().unwrap_or_default();
    let (access_control, access_control_source) = if overrides.merge_strategy
        == AccessControlMergeStrategy::OverrideOnly
        || !overrides.inherit_global_access_control
    {
        (local, Source::Firewall)
    } else {
        let global_rules = global.access_control.clone().unwrap_or_default();
        let merged = match overrides.merge_strategy {
            AccessControlMergeStrategy::GlobalFirst => AccessControl::merged(&global_rules, &local),
            _ => AccessControl::merged(&local, &global_rules),
        };
        (merged, Source::Merged)
    };

    CompiledFirewall {
        stateless: overrides.stateless,
        sources: ComponentSources {
            access_control: access_control_source,
            role_hierarchy: role_hierarchy_source,
            access_decision_manager: decision_manager_source,
            entry_point: entry_point_source,
            access_denied_handler: access_denied_handler_source,
        },
        access_control,
        access_decision_manager: decision_manager,
        role_hierarchy,
        entry_point,
        access_denied_handler,
        name: definition.name,
        matcher: definition.matcher,
        rules: definition.rules,
        token_source: definition.token_source,
        login_path: definition.login_path,
        logout_path: definition.logout_path,
        login_handler: definition.login_handler,
        logout_handler: definition.logout_handler,
    }
}
