//! Firewalls, access control and authorization decisions
//!
//! Configuration is declared with a [`SecurityBuilder`] and compiled into a
//! [`CompiledConfiguration`]. At request time a [`FirewallRegistry`] picks the
//! first matching firewall, the [`SecurityResolutionListener`] runs its rules
//! and resolves a [`Token`], and the [`AccessControlListener`] checks the
//! governing [`AccessControl`] rule through the firewall's
//! [`AccessDecisionManager`].
//!
//! ```ignore
//! let config = SecurityBuilder::new()
//!     .with_global(GlobalSecurity::new().with_access_control(rules))
//!     .with_firewall(FirewallDefinition::new("api", matcher, token_source).stateless())
//!     .compile()?;
//! let registry = FirewallRegistry::new(config);
//! ```

pub mod access_control;
pub mod builder;
pub mod context;
pub mod contract;
pub mod decision;
pub mod error;
pub mod firewall;
pub mod listener;
pub mod matcher;
pub mod role_hierarchy;
pub mod rule;
pub mod token;
pub mod token_source;
pub mod voter;

pub use access_control::{AccessControl, AccessControlMatch, AccessControlRule, RuleKind};
pub use builder::{
    AccessControlMergeStrategy, FirewallDefinition, FirewallOverride, GlobalSecurity,
    SecurityBuilder,
};
pub use context::{MatchedAccessControlRule, SecurityContext, Source};
pub use contract::{
    AccessDeniedHandler, Authenticator, ChallengeEntryPoint, EntryPoint, LoginHandler,
    LoginRedirectEntryPoint, LoginResult, LogoutHandler, RequestMatcher, Rule, TokenSource,
};
pub use decision::{AccessDecisionManager, DecisionStrategy};
pub use error::{SecurityError, SecurityResult};
pub use firewall::{
    CompiledConfiguration, CompiledFirewall, ComponentSources, FirewallManager, FirewallRegistry,
};
pub use listener::{
    AccessControlListener, Authorization, Resolution, SecurityResolutionListener, PUBLIC_ACCESS,
};
pub use matcher::{AnyRequestMatcher, HostMatcher, PathPrefixMatcher};
pub use role_hierarchy::RoleHierarchy;
pub use rule::{ApiKeyHeaderRule, IpAccessRule};
pub use token::Token;
pub use token_source::{
    ApiKeyHeaderAuthenticator, AuthenticatorManager, AuthenticatorTokenSource, ResolverTokenSource,
};
pub use voter::{
    AuthenticatedVoter, RoleHierarchyVoter, RoleVoter, Subject, VoteResult, Voter, IS_AUTHENTICATED,
};
