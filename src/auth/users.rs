//! User directory backed by a JSON file.
//!
//! ```json
//! [
//!   { "name": "admin", "groups": ["admin"], "password": "$argon2id$v=19$..." },
//!   { "name": "lobby", "groups": ["display"], "password": "$argon2id$v=19$..." }
//! ]
//! ```
//!
//! Passwords are stored as argon2 PHC strings; use the `hash-password`
//! subcommand to produce them.

use std::collections::HashMap;
use std::path::Path;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Maximum length of a user name.
pub const MAX_USER_NAME_LEN: usize = 64;

/// A single entry of the users file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,

    #[serde(default)]
    pub groups: Vec<String>,

    /// argon2 PHC string
    pub password: String,
}

/// In-memory index of known users.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    /// Build a directory from records, rejecting invalid or duplicate names.
    pub fn from_records(records: Vec<UserRecord>) -> Result<Self, StoreError> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            if !is_valid_user_name(&record.name) {
                return Err(StoreError::Corrupt {
                    path: "users".to_string(),
                    message: format!("invalid user name '{}'", record.name),
                });
            }
            if users.contains_key(&record.name) {
                return Err(StoreError::Corrupt {
                    path: "users".to_string(),
                    message: format!("duplicate user '{}'", record.name),
                });
            }
            users.insert(record.name.clone(), record);
        }
        Ok(Self { users })
    }

    /// Load the users file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| StoreError::io(&shown, e))?;
        let records: Vec<UserRecord> =
            serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
                path: shown.clone(),
                message: e.to_string(),
            })?;

        let directory = Self::from_records(records).map_err(|e| match e {
            StoreError::Corrupt { message, .. } => StoreError::Corrupt {
                path: shown.clone(),
                message,
            },
            other => other,
        })?;
        debug!(path = %shown, users = directory.len(), "Loaded user directory");
        Ok(directory)
    }

    pub fn get(&self, name: &str) -> Option<&UserRecord> {
        self.users.get(name)
    }

    /// Check a password. Returns the user record on success.
    ///
    /// This is CPU-bound; async callers should run it on a blocking thread.
    pub fn verify_password(&self, name: &str, password: &str) -> Option<&UserRecord> {
        let record = self.users.get(name)?;

        let hash = match PasswordHash::new(&record.password) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(user = %name, "Stored password hash is not a valid PHC string: {}", e);
                return None;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .ok()
            .map(|_| record)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Hash a password into an argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("failed to hash password: {}", e))
}

/// User names are 1..=64 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_user_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_USER_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
