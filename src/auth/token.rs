//! Signed bearer tokens.
//!
//! Tokens bind a user name to an expiry time with an HMAC-SHA256 signature:
//!
//! ```text
//! token     = "{user}.{expiry}.{signature}"
//! signature = hex(HMAC-SHA256(secret_key, "{user}.{expiry}"))
//! ```
//!
//! User names are restricted to `[A-Za-z0-9_-]`, so the `.` separator is
//! unambiguous. Signatures are compared in constant time.
//!
//! # Example
//!
//! ```rust
//! use signage_api::auth::TokenSigner;
//! use std::time::Duration;
//!
//! let signer = TokenSigner::new("my-secret-key");
//! let token = signer.issue("editor", Duration::from_secs(3600)).unwrap();
//!
//! assert_eq!(signer.verify(&token).unwrap(), "editor");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::users::is_valid_user_name;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Reasons a bearer token is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token does not have the `user.expiry.signature` shape
    Malformed,

    /// User part is empty or contains forbidden characters
    InvalidUser,

    /// Expiry part is not a valid integer
    InvalidExpiryFormat,

    /// Token has expired
    Expired {
        /// When the token expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Signature part is not valid hex
    InvalidSignatureFormat,

    /// Signature does not match
    InvalidSignature,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidUser => write!(f, "Invalid user in token"),
            TokenError::InvalidExpiryFormat => write!(f, "Invalid token expiry format"),
            TokenError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Token expired at {} (current time: {})",
                expired_at, current_time
            ),
            TokenError::InvalidSignatureFormat => write!(f, "Invalid token signature format"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl TokenSigner {
    /// Create a new signer with the given secret key.
    ///
    /// The key should be at least 32 bytes.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Issue a token for `user` that is valid for `ttl` from now.
    pub fn issue(&self, user: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_with_expiry(user, unix_now().saturating_add(ttl.as_secs()))
    }

    /// Issue a token that expires at a specific Unix timestamp.
    pub fn issue_with_expiry(&self, user: &str, expiry: u64) -> Result<String, TokenError> {
        if !is_valid_user_name(user) {
            return Err(TokenError::InvalidUser);
        }
        let signature = self.compute_signature(user, expiry);
        Ok(format!("{}.{}.{}", user, expiry, signature))
    }

    /// Verify a token against the current time.
    ///
    /// Returns the user name the token was issued for.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, unix_now())
    }

    /// Verify a token as of `current_time` (Unix seconds).
    pub fn verify_at(&self, token: &str, current_time: u64) -> Result<String, TokenError> {
        let mut parts = token.split('.');
        let (user, expiry, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(u), Some(e), Some(s)) => (u, e, s),
            _ => return Err(TokenError::Malformed),
        };
        if parts.next().is_some() {
            return Err(TokenError::Malformed);
        }

        if !is_valid_user_name(user) {
            return Err(TokenError::InvalidUser);
        }

        let expiry: u64 = expiry
            .parse()
            .map_err(|_| TokenError::InvalidExpiryFormat)?;

        // Check expiry first
        if current_time > expiry {
            return Err(TokenError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        let provided_sig = hex::decode(signature).map_err(|_| TokenError::InvalidSignatureFormat)?;
        let expected_sig = self.compute_mac(user, expiry);

        if provided_sig.ct_eq(&expected_sig).into() {
            Ok(user.to_string())
        } else {
            Err(TokenError::InvalidSignature)
        }
    }

    fn compute_signature(&self, user: &str, expiry: u64) -> String {
        hex::encode(self.compute_mac(user, expiry))
    }

    fn compute_mac(&self, user: &str, expiry: u64) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(user.as_bytes());
        mac.update(b".");
        mac.update(expiry.to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
