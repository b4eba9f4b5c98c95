//! Security tokens

/// Identity attached to a request by a token source
///
/// An anonymous token has no identifier and no roles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    user_identifier: Option<String>,
    roles: Vec<String>,
    authenticated: bool,
}

impl Token {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated<I, S>(user_identifier: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_identifier: Some(user_identifier.to_string()),
            roles: roles.into_iter().map(Into::into).collect(),
            authenticated: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// User identifier, empty for anonymous tokens
    pub fn user_identifier(&self) -> &str {
        self.user_identifier.as_deref().unwrap_or("")
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
