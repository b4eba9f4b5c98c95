//! Token sources and authenticators

use std::sync::Arc;

use subtle::ConstantTimeEq;

use super::contract::{Authenticator, TokenSource};
use super::error::{SecurityError, SecurityResult};
use super::token::Token;
use crate::events::{Event, EventSink};
use crate::http::HttpRequest;

/// Function resolving a token from a request
pub type TokenResolver = Arc<dyn Fn(&HttpRequest) -> SecurityResult<Option<Token>> + Send + Sync>;

/// Token source backed by a plain function
#[derive(Clone)]
pub struct ResolverTokenSource {
    name: String,
    resolver: TokenResolver,
}

impl ResolverTokenSource {
    pub fn new<F>(name: &str, resolver: F) -> Self
    where
        F: Fn(&HttpRequest) -> SecurityResult<Option<Token>> + Send + Sync + 'static,
    {
        Self { name: name.to_string(), resolver: Arc::new(resolver) }
    }
}

impl TokenSource for ResolverTokenSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, _events: &dyn EventSink, request: &HttpRequest) -> SecurityResult<Option<Token>> {
        (self.resolver)(request)
    }
}

/// Runs the first authenticator that supports a request
#[derive(Clone, Default)]
pub struct AuthenticatorManager {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl AuthenticatorManager {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticators.push(authenticator);
        self
    }

    /// `Ok(None)` when no authenticator supports the request
    ///
    /// A supporting authenticator that identifies nobody yields an anonymous
    /// token; its errors are returned as-is.
    pub fn authenticate(&self, request: &HttpRequest) -> SecurityResult<Option<Token>> {
        match self.authenticators.iter().find(|a| a.supports(request)) {
            Some(authenticator) => {
                Ok(Some(authenticator.authenticate(request)?.unwrap_or_else(Token::anonymous)))
            }
            None => Ok(None),
        }
    }
}

/// Token source emitting login events around an [`AuthenticatorManager`]
#[derive(Clone)]
pub struct AuthenticatorTokenSource {
    manager: AuthenticatorManager,
}

impl AuthenticatorTokenSource {
    pub fn new(manager: AuthenticatorManager) -> Self {
        Self { manager }
    }
}

impl TokenSource for AuthenticatorTokenSource {
    fn name(&self) -> &str {
        "authenticators"
    }

    fn resolve(&self, events: &dyn EventSink, request: &HttpRequest) -> SecurityResult<Option<Token>> {
        match self.manager.authenticate(request) {
            Err(err) => {
                events.dispatch(&Event::LoginFailure {
                    path: request.path().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
            Ok(Some(token)) if token.is_authenticated() => {
                events.dispatch(&Event::LoginSuccess {
                    path: request.path().to_string(),
                    user_identifier: token.user_identifier().to_string(),
                });
                Ok(Some(token))
            }
            Ok(token) => Ok(token),
        }
    }
}

/// Authenticates requests carrying a known API key header
#[derive(Debug, Clone)]
pub struct ApiKeyHeaderAuthenticator {
    header_name: String,
    expected_value: String,
    user_identifier: String,
    roles: Vec<String>,
}

impl ApiKeyHeaderAuthenticator {
    pub fn new<I, S>(
        header_name: &str,
        expected_value: &str,
        user_identifier: &str,
        roles: I,
    ) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header_name = header_name.trim();
        if header_name.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "api key authenticator requires a header name".to_string(),
            ));
        }
        Ok(Self {
            header_name: header_name.to_string(),
            expected_value: expected_value.to_string(),
            user_identifier: user_identifier.to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
        })
    }
}

impl Authenticator for ApiKeyHeaderAuthenticator {
    fn supports(&self, request: &HttpRequest) -> bool {
        request.header(&self.header_name).is_some_and(|value| !value.is_empty())
    }

    fn authenticate(&self, request: &HttpRequest) -> SecurityResult<Option<Token>> {
        let matches = request
            .header(&self.header_name)
            .is_some_and(|value| bool::from(value.as_bytes().ct_eq(self.expected_value.as_bytes())));
        if matches {
            Ok(Some(Token::authenticated(&self.user_identifier, self.roles.clone())))
        } else {
            Ok(None)
        }
    }
}
