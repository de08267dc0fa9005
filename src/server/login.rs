//! Form login and logout.
//!
//! Unlike the API endpoints these never answer with JSON: every outcome is a
//! `303 See Other`, and failures are encoded in the redirect target.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth::{
    cookie_value, expired_session_cookie, session_cookie, CredentialVerifier, SESSION_COOKIE,
};

/// The login page.
pub const LOGIN_PAGE: &str = "/login/";

/// Where failed logins are sent.
pub const LOGIN_FAILED_PAGE: &str = "/login/?failed=1";

#[derive(Clone)]
pub struct LoginState {
    pub verifier: Arc<CredentialVerifier>,
    /// Redirect target after a successful login
    pub landing_page: String,
    /// Mark session cookies `Secure`
    pub secure_cookies: bool,
}

/// Fields of the login form. Absent fields deserialize as empty.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub pass: String,
}

impl LoginForm {
    /// Both fields, if neither is empty.
    fn credentials(self) -> Option<(String, String)> {
        (!self.user.is_empty() && !self.pass.is_empty()).then_some((self.user, self.pass))
    }
}

/// `POST /login` with form fields `user` and `pass`.
///
/// Callers that already hold a valid session go straight to the landing page.
/// A body that is not a valid form counts as a failed login.
pub async fn login_handler(
    State(state): State<LoginState>,
    headers: HeaderMap,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    if let Some(user) = state.verifier.session_user(&headers).await {
        debug!(user = %user, "Already logged in");
        return redirect(&state.landing_page, None);
    }

    let credentials = match form {
        Ok(Form(form)) => form.credentials(),
        Err(rejection) => {
            debug!("Rejected login form: {}", rejection);
            None
        }
    };
    let Some((user, pass)) = credentials else {
        debug!("Login form without credentials");
        return redirect(LOGIN_FAILED_PAGE, None);
    };

    let users = state.verifier.users().clone();
    let candidate = user.clone();
    let verified =
        tokio::task::spawn_blocking(move || users.verify_password(&candidate, &pass).is_some())
            .await;

    match verified {
        Ok(true) => {
            let sessions = state.verifier.sessions();
            let id = sessions.create(&user).await;
            info!(user = %user, "User logged in");
            redirect(
                &state.landing_page,
                Some(session_cookie(&id, sessions.ttl(), state.secure_cookies)),
            )
        }
        Ok(false) => {
            warn!(user = %user, "Failed login attempt");
            redirect(LOGIN_FAILED_PAGE, None)
        }
        Err(e) => {
            error!("Password verification task failed: {}", e);
            redirect(LOGIN_FAILED_PAGE, None)
        }
    }
}

/// `POST /logout`: drop the session and expire the cookie.
pub async fn logout_handler(State(state): State<LoginState>, headers: HeaderMap) -> Response {
    if let Some(id) = cookie_value(&headers, SESSION_COOKIE) {
        if state.verifier.sessions().remove(&id).await {
            debug!("Session closed");
        }
    }
    redirect(
        LOGIN_PAGE,
        Some(expired_session_cookie(state.secure_cookies)),
    )
}

fn redirect(target: &str, cookie: Option<String>) -> Response {
    let mut response = Redirect::to(target).into_response();
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
