//! Authentication: users, sessions, bearer tokens and the credential verifier.
//!
//! ```text
//!            Cookie: session_id=...          Authorization: Bearer ...
//!                      │                                 │
//!                      ▼                                 ▼
//!              ┌──────────────┐                 ┌────────────────┐
//!              │ SessionStore │                 │  TokenSigner   │
//!              └──────┬───────┘                 └───────┬────────┘
//!                     └──────────────┬──────────────────┘
//!                                    ▼
//!                         ┌────────────────────┐
//!                         │ CredentialVerifier │──► UserDirectory
//!                         └─────────┬──────────┘
//!                                   ▼
//!                               Principal
//! ```

mod principal;
mod session;
mod token;
mod users;
mod verifier;

pub use principal::{AuthMethod, Principal};
pub use session::{
    cookie_value, expired_session_cookie, session_cookie, SessionStore, DEFAULT_SESSION_TTL,
    SESSION_COOKIE,
};
pub use token::{TokenError, TokenSigner};
pub use users::{hash_password, is_valid_user_name, UserDirectory, UserRecord, MAX_USER_NAME_LEN};
pub use verifier::{AcceptedMethods, CredentialVerifier};
