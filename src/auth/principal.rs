use std::collections::BTreeSet;

/// How a caller proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Session cookie
    Cookie,
    /// `Authorization: Bearer` token
    Token,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Cookie => "cookie",
            AuthMethod::Token => "token",
        }
    }
}

/// The authenticated caller of a request.
///
/// Built by the credential verifier and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user: String,
    groups: BTreeSet<String>,
    method: AuthMethod,
}

impl Principal {
    pub fn new<I, G>(user: impl Into<String>, groups: I, method: AuthMethod) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Self {
            user: user.into(),
            groups: groups.into_iter().map(Into::into).collect(),
            method,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    /// True if the principal belongs to at least one of `groups`.
    pub fn is_in_group(&self, groups: &[&str]) -> bool {
        groups.iter().any(|g| self.groups.contains(*g))
    }
}
