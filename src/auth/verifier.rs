//! Credential verification: session cookie or bearer token → [`Principal`].

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::HeaderMap;
use tracing::{debug, warn};

use crate::error::ApiError;

use super::principal::{AuthMethod, Principal};
use super::session::{cookie_value, SessionStore, SESSION_COOKIE};
use super::token::{TokenError, TokenSigner};
use super::users::UserDirectory;

/// Credential forms an endpoint accepts.
///
/// There is no way to build a value that accepts nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedMethods {
    cookie: bool,
    token: bool,
}

impl AcceptedMethods {
    pub const fn cookie_or_token() -> Self {
        Self {
            cookie: true,
            token: true,
        }
    }

    pub const fn cookie_only() -> Self {
        Self {
            cookie: true,
            token: false,
        }
    }

    pub const fn token_only() -> Self {
        Self {
            cookie: false,
            token: true,
        }
    }

    pub fn accepts(self, method: AuthMethod) -> bool {
        match method {
            AuthMethod::Cookie => self.cookie,
            AuthMethod::Token => self.token,
        }
    }
}

impl Default for AcceptedMethods {
    fn default() -> Self {
        Self::cookie_or_token()
    }
}

/// Resolves the caller of a request from its headers.
pub struct CredentialVerifier {
    tokens: TokenSigner,
    sessions: Arc<SessionStore>,
    users: Arc<UserDirectory>,
}

impl CredentialVerifier {
    pub fn new(tokens: TokenSigner, sessions: Arc<SessionStore>, users: Arc<UserDirectory>) -> Self {
        Self {
            tokens,
            sessions,
            users,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    /// Authenticate a request.
    ///
    /// A bearer token, when accepted and present, takes precedence over the
    /// session cookie. A present but invalid token fails the request even if
    /// a valid cookie is also sent.
    pub async fn verify(
        &self,
        headers: &HeaderMap,
        accepted: AcceptedMethods,
    ) -> Result<Principal, ApiError> {
        if accepted.accepts(AuthMethod::Token) {
            if let Some(token) = bearer_token(headers)? {
                let user = self.tokens.verify(token).map_err(|e| {
                    match e {
                        TokenError::InvalidSignature => warn!("Token rejected: {}", e),
                        _ => debug!("Token rejected: {}", e),
                    }
                    ApiError::Unauthorized("Invalid or expired token.".to_string())
                })?;
                return self.principal_for(&user, AuthMethod::Token);
            }
        }

        if accepted.accepts(AuthMethod::Cookie) {
            if let Some(session_id) = cookie_value(headers, SESSION_COOKIE) {
                let user = self.sessions.resolve(&session_id).await.ok_or_else(|| {
                    debug!("Unknown or expired session");
                    ApiError::Unauthorized("Session expired or invalid.".to_string())
                })?;
                return self.principal_for(&user, AuthMethod::Cookie);
            }
        }

        Err(ApiError::Unauthorized("Not authenticated.".to_string()))
    }

    /// Resolve the user behind a session cookie without producing an error.
    ///
    /// Used by the login form to detect callers that are already logged in.
    pub async fn session_user(&self, headers: &HeaderMap) -> Option<String> {
        let session_id = cookie_value(headers, SESSION_COOKIE)?;
        let user = self.sessions.resolve(&session_id).await?;
        self.users.get(&user).map(|record| record.name.clone())
    }

    fn principal_for(&self, user: &str, method: AuthMethod) -> Result<Principal, ApiError> {
        let record = self.users.get(user).ok_or_else(|| {
            debug!(user = %user, "Credential names an unknown user");
            ApiError::Unauthorized("Unknown user.".to_string())
        })?;
        Ok(Principal::new(
            record.name.clone(),
            record.groups.iter().cloned(),
            method,
        ))
    }
}

/// Extract a bearer token from the `Authorization` header.
///
/// Returns `Ok(None)` when no bearer credential is present.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header encoding.".to_string())
    })?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        Some(_) => Err(ApiError::Unauthorized("Empty bearer token.".to_string())),
        None => Ok(None),
    }
}
