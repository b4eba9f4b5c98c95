//! Extension points of the firewall layer

use std::fmt;

use super::error::{SecurityError, SecurityResult};
use super::token::Token;
use crate::events::EventSink;
use crate::http::{HttpRequest, HttpResponse};

/// Selects the requests a firewall (or a rule) is responsible for
pub trait RequestMatcher: Send + Sync + fmt::Debug {
    fn matches(&self, request: &HttpRequest) -> bool;
}

/// Pre-authentication check run by a firewall before any token is resolved
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn applies(&self, request: &HttpRequest) -> bool;

    fn check(&self, request: &HttpRequest) -> SecurityResult<()>;
}

/// Resolves the token of a request
///
/// `Ok(None)` means no identity could be established; the request continues
/// with an anonymous token.
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &str;

    fn resolve(&self, events: &dyn EventSink, request: &HttpRequest) -> SecurityResult<Option<Token>>;
}

/// Credential check driven by an [`AuthenticatorManager`](super::token_source::AuthenticatorManager)
pub trait Authenticator: Send + Sync {
    fn supports(&self, request: &HttpRequest) -> bool;

    /// `Ok(None)` means the credentials were present but did not identify anyone
    fn authenticate(&self, request: &HttpRequest) -> SecurityResult<Option<Token>>;
}

/// Produces the response sent to unauthenticated requests that need a login
pub trait EntryPoint: Send + Sync {
    fn start(&self, request: &HttpRequest, reason: &SecurityError) -> SecurityResult<HttpResponse>;
}

/// Produces the response sent when an authenticated token is denied
///
/// Returning `Ok(None)` is a misconfiguration and is reported as an error.
pub trait AccessDeniedHandler: Send + Sync {
    fn handle(
        &self,
        request: &HttpRequest,
        error: &SecurityError,
    ) -> SecurityResult<Option<HttpResponse>>;
}

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: Token,
    pub response: HttpResponse,
}

/// Performs the login of a stateful firewall
pub trait LoginHandler: Send + Sync {
    fn login(&self, request: &HttpRequest) -> SecurityResult<LoginResult>;
}

/// Performs the logout of a stateful firewall
pub trait LogoutHandler: Send + Sync {
    fn logout(&self, request: &HttpRequest, token: &Token) -> SecurityResult<HttpResponse>;
}

/// Redirects to a login path
#[derive(Debug, Clone)]
pub struct LoginRedirectEntryPoint {
    login_path: String,
}

impl LoginRedirectEntryPoint {
    pub fn new(login_path: &str) -> Self {
        Self { login_path: login_path.to_string() }
    }
}

impl EntryPoint for LoginRedirectEntryPoint {
    fn start(&self, _request: &HttpRequest, _reason: &SecurityError) -> SecurityResult<HttpResponse> {
        Ok(HttpResponse::redirect(&self.login_path))
    }
}

/// Answers with a JSON 401 carrying a `WWW-Authenticate` challenge
#[derive(Debug, Clone)]
pub struct ChallengeEntryPoint {
    challenge: String,
}

impl ChallengeEntryPoint {
    pub fn new(challenge: &str) -> Self {
        Self { challenge: challenge.to_string() }
    }
}

impl EntryPoint for ChallengeEntryPoint {
    fn start(&self, _request: &HttpRequest, reason: &SecurityError) -> SecurityResult<HttpResponse> {
        Ok(crate::http::json_error(
            crate::http::StatusCode::Unauthorized,
            "unauthorized",
            &reason.to_string(),
        )
        .header(crate::http::constants::headers::WWW_AUTHENTICATE, &self.challenge))
    }
}
