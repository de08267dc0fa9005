//! Cookie sessions.
//!
//! Sessions live in memory only; restarting the server logs everyone out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use http::header::COOKIE;
use http::HeaderMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Default session lifetime (10 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct Session {
    user: String,
    created: Instant,
}

impl Session {
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created) < ttl
    }
}

/// Session id → user mapping with expiry.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user` and return its id.
    pub async fn create(&self, user: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let session = Session {
            user: user.to_string(),
            created: Instant::now(),
        };
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// Look up the user owning a session. Expired sessions are dropped.
    pub async fn resolve(&self, id: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(session) if session.is_live(Instant::now(), self.ttl) => {
                    return Some(session.user.clone());
                }
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(id);
        None
    }

    /// End a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_live(now, self.ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// Extract a cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix(&prefix))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// `Set-Cookie` value establishing a session.
///
/// `secure` adds the `Secure` attribute for deployments served over TLS.
pub fn session_cookie(id: &str, ttl: Duration, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE,
        id,
        ttl.as_secs(),
        secure_attr(secure)
    )
}

/// `Set-Cookie` value clearing the session cookie.
pub fn expired_session_cookie(secure: bool) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        SESSION_COOKIE,
        secure_attr(secure)
    )
}

fn secure_attr(secure: bool) -> &'static str {
    if secure {
        "; Secure"
    } else {
        ""
    }
}
