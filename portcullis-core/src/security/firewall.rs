//! Compiled firewalls, the registry that selects them and lookup by name

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::access_control::AccessControl;
use super::context::Source;
use super::contract::{
    AccessDeniedHandler, EntryPoint, LoginHandler, LoginResult, LogoutHandler, RequestMatcher, Rule,
    TokenSource,
};
use super::decision::AccessDecisionManager;
use super::error::{SecurityError, SecurityResult};
use super::role_hierarchy::RoleHierarchy;
use super::token::Token;
use crate::events::{Event, EventSink};
use crate::http::{HttpRequest, HttpResponse};

/// Provenance of each inheritable component of a firewall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentSources {
    pub access_control: Source,
    pub role_hierarchy: Source,
    pub access_decision_manager: Source,
    pub entry_point: Source,
    pub access_denied_handler: Source,
}

/// A firewall with global settings already folded in
pub struct CompiledFirewall {
    pub(crate) name: String,
    pub(crate) stateless: bool,
    pub(crate) matcher: Arc<dyn RequestMatcher>,
    pub(crate) rules: Vec<Arc<dyn Rule>>,
    pub(crate) token_source: Arc<dyn TokenSource>,
    pub(crate) access_control: AccessControl,
    pub(crate) access_decision_manager: Option<AccessDecisionManager>,
    pub(crate) role_hierarchy: Option<Arc<RoleHierarchy>>,
    pub(crate) entry_point: Option<Arc<dyn EntryPoint>>,
    pub(crate) access_denied_handler: Option<Arc<dyn AccessDeniedHandler>>,
    pub(crate) login_path: Option<String>,
    pub(crate) logout_path: Option<String>,
    pub(crate) login_handler: Option<Arc<dyn LoginHandler>>,
    pub(crate) logout_handler: Option<Arc<dyn LogoutHandler>>,
    pub(crate) sources: ComponentSources,
}

impl CompiledFirewall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stateless(&self) -> bool {
        self.stateless
    }

    pub fn matches(&self, request: &HttpRequest) -> bool {
        self.matcher.matches(request)
    }

    /// Run the pre-authentication rules in order; the first failure wins
    pub fn check(&self, request: &HttpRequest) -> SecurityResult<()> {
        for rule in self.rules.iter().filter(|rule| rule.applies(request)) {
            rule.check(request).map_err(|err| {
                log::debug!("Firewall '{}' rule '{}' rejected {}: {}", self.name, rule.name(), request.path(), err);
                err
            })?;
        }
        Ok(())
    }

    pub fn rules(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.clone()
    }

    pub fn token_source(&self) -> &Arc<dyn TokenSource> {
        &self.token_source
    }

    pub fn access_control(&self) -> &AccessControl {
        &self.access_control
    }

    pub fn access_decision_manager(&self) -> Option<&AccessDecisionManager> {
        self.access_decision_manager.as_ref()
    }

    pub fn role_hierarchy(&self) -> Option<&Arc<RoleHierarchy>> {
        self.role_hierarchy.as_ref()
    }

    pub fn entry_point(&self) -> Option<&Arc<dyn EntryPoint>> {
        self.entry_point.as_ref()
    }

    pub fn access_denied_handler(&self) -> Option<&Arc<dyn AccessDeniedHandler>> {
        self.access_denied_handler.as_ref()
    }

    pub fn login_path(&self) -> Option<&str> {
        self.login_path.as_deref()
    }

    pub fn logout_path(&self) -> Option<&str> {
        self.logout_path.as_deref()
    }

    pub fn sources(&self) -> ComponentSources {
        self.sources
    }

    /// Run the login handler, emitting a login success or failure event
    pub fn login(&self, events: &dyn EventSink, request: &HttpRequest) -> SecurityResult<LoginResult> {
        let handler = self.login_handler.as_ref().ok_or_else(|| {
            SecurityError::InvalidConfiguration(format!("firewall '{}' has no login handler", self.name))
        })?;
        match handler.login(request) {
            Ok(result) => {
                events.dispatch(&Event::LoginSuccess {
                    path: request.path().to_string(),
                    user_identifier: result.token.user_identifier().to_string(),
                });
                Ok(result)
            }
            Err(err) => {
                events.dispatch(&Event::LoginFailure {
                    path: request.path().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Run the logout handler, emitting a logout success or failure event
    pub fn logout(
        &self,
        events: &dyn EventSink,
        request: &HttpRequest,
        token: &Token,
    ) -> SecurityResult<HttpResponse> {
        let handler = self.logout_handler.as_ref().ok_or_else(|| {
            SecurityError::InvalidConfiguration(format!("firewall '{}' has no logout handler", self.name))
        })?;
        match handler.logout(request, token) {
            Ok(response) => {
                events.dispatch(&Event::LogoutSuccess { path: request.path().to_string() });
                Ok(response)
            }
            Err(err) => {
                events.dispatch(&Event::LogoutFailure {
                    path: request.path().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

impl fmt::Debug for CompiledFirewall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFirewall")
            .field("name", &self.name)
            .field("stateless", &self.stateless)
            .field("matcher", &self.matcher)
            .field("rules", &self.rules.len())
            .field("token_source", &self.token_source.name())
            .field("access_control", &self.access_control)
            .field("access_decision_manager", &self.access_decision_manager)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Result of compiling a security configuration
#[derive(Debug, Clone, Default)]
pub struct CompiledConfiguration {
    pub(crate) firewalls: Vec<Arc<CompiledFirewall>>,
    pub(crate) global_access_control: Option<AccessControl>,
}

impl CompiledConfiguration {
    /// Firewalls in declaration order
    pub fn firewalls(&self) -> Vec<Arc<CompiledFirewall>> {
        self.firewalls.clone()
    }

    pub fn global_access_control(&self) -> Option<&AccessControl> {
        self.global_access_control.as_ref()
    }
}

/// Selects the firewall responsible for a request
#[derive(Debug, Clone, Default)]
pub struct FirewallRegistry {
    firewalls: Vec<Arc<CompiledFirewall>>,
    global_access_control: Option<AccessControl>,
}

impl FirewallRegistry {
    pub fn new(configuration: CompiledConfiguration) -> Self {
        Self {
            firewalls: configuration.firewalls,
            global_access_control: configuration.global_access_control,
        }
    }

    /// First firewall, in declaration order, whose matcher accepts the request
    pub fn match_request(&self, request: &HttpRequest) -> Option<Arc<CompiledFirewall>> {
        self.firewalls.iter().find(|fw| fw.matches(request)).cloned()
    }

    pub fn global_access_control(&self) -> Option<&AccessControl> {
        self.global_access_control.as_ref()
    }

    pub fn firewalls(&self) -> Vec<Arc<CompiledFirewall>> {
        self.firewalls.clone()
    }
}

/// Lookup of compiled firewalls by name
#[derive(Debug, Clone, Default)]
pub struct FirewallManager {
    firewalls: HashMap<String, Arc<CompiledFirewall>>,
}

impl FirewallManager {
    pub fn new(configuration: &CompiledConfiguration) -> Self {
        let firewalls =
            configuration.firewalls.iter().map(|fw| (fw.name.clone(), Arc::clone(fw))).collect();
        Self { firewalls }
    }

    pub fn firewall(&self, name: &str) -> SecurityResult<Arc<CompiledFirewall>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SecurityError::InvalidConfiguration("firewall name is empty".to_string()));
        }
        self.firewalls
            .get(name)
            .cloned()
            .ok_or_else(|| SecurityError::InvalidConfiguration(format!("unknown firewall '{}'", name)))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.firewalls.keys().cloned().collect();
        names.sort();
        names
    }
}
