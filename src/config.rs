//! Configuration management for the signage API.
//!
//! Configuration comes from command-line arguments, environment variables
//! with the `SIGNAGE_` prefix, and the defaults below.
//!
//! # Environment Variables
//!
//! - `SIGNAGE_HOST` - Server bind address (default: 0.0.0.0)
//! - `SIGNAGE_PORT` - Server port (default: 8080)
//! - `SIGNAGE_SLIDES_DIR` - Slide directory (default: data/slides)
//! - `SIGNAGE_USERS_FILE` - Users file (default: data/users.json)
//! - `SIGNAGE_AUTH_SECRET` - HMAC secret for bearer tokens (required)
//! - `SIGNAGE_SESSION_TTL` - Session lifetime in seconds (default: 600)
//! - `SIGNAGE_RATE_LIMIT` - Requests per window per caller and route (default: 120)
//! - `SIGNAGE_RATE_WINDOW` - Rate-limit window in seconds (default: 60)
//! - `SIGNAGE_RATE_LIMIT_KEYS` - Max tracked rate-limit windows (default: 10000)
//! - `SIGNAGE_STORE_TIMEOUT_MS` - Rate-limit store timeout (default: 250)
//! - `SIGNAGE_FAIL_MODE` - `closed` or `open` when the store is unavailable (default: closed)
//! - `SIGNAGE_COOKIE_SECURE` - Mark session cookies `Secure` (default: false)
//! - `SIGNAGE_LANDING_PAGE` - Redirect after login (default: /control)
//! - `SIGNAGE_CACHE_MAX_AGE` - Thumbnail cache max-age seconds (default: 3600)
//! - `SIGNAGE_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::auth::{is_valid_user_name, DEFAULT_SESSION_TTL};
use crate::ratelimit::{
    FailMode, RateLimitPolicy, DEFAULT_MAX_TRACKED_KEYS, DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW,
    DEFAULT_STORE_TIMEOUT,
};
use crate::server::{DEFAULT_CACHE_MAX_AGE, DEFAULT_LANDING_PAGE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default slide directory.
pub const DEFAULT_SLIDES_DIR: &str = "data/slides";

/// Default users file.
pub const DEFAULT_USERS_FILE: &str = "data/users.json";

/// Default lifetime of tokens printed by `token` (1 hour).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Minimum accepted length of the token secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Longest accepted rate-limit window (1 day).
pub const MAX_RATE_WINDOW_SECS: u64 = 24 * 3600;

/// Longest accepted rate-limit store timeout (1 minute).
pub const MAX_STORE_TIMEOUT_MS: u64 = 60_000;

/// Longest accepted lifetime of tokens printed by `token` (1 year).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Signage API - authenticated, rate-limited access to slide assets.
#[derive(Parser, Debug, Clone)]
#[command(name = "signage-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeConfig),

    /// Print a signed bearer token for a user
    Token(TokenConfig),

    /// Print an argon2 hash for the users file
    HashPassword(HashPasswordConfig),
}

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "SIGNAGE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "SIGNAGE_PORT")]
    pub port: u16,

    // =========================================================================
    // Data
    // =========================================================================
    /// Directory holding one sub-directory per slide.
    #[arg(long, default_value = DEFAULT_SLIDES_DIR, env = "SIGNAGE_SLIDES_DIR")]
    pub slides_dir: PathBuf,

    /// JSON file listing users, their groups and password hashes.
    #[arg(long, default_value = DEFAULT_USERS_FILE, env = "SIGNAGE_USERS_FILE")]
    pub users_file: PathBuf,

    // =========================================================================
    // Authentication
    // =========================================================================
    /// Secret key for HMAC-SHA256 bearer tokens.
    #[arg(long, env = "SIGNAGE_AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL.as_secs(), env = "SIGNAGE_SESSION_TTL")]
    pub session_ttl: u64,

    /// Mark session cookies `Secure`; enable when served over TLS.
    #[arg(long, default_value_t = false, env = "SIGNAGE_COOKIE_SECURE")]
    pub cookie_secure: bool,

    /// Page to redirect to after login.
    #[arg(long, default_value = DEFAULT_LANDING_PAGE, env = "SIGNAGE_LANDING_PAGE")]
    pub landing_page: String,

    // =========================================================================
    // Rate Limiting
    // =========================================================================
    /// Requests allowed per window, per caller and route.
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT, env = "SIGNAGE_RATE_LIMIT")]
    pub rate_limit: u32,

    /// Rate-limit window in seconds.
    #[arg(long, default_value_t = DEFAULT_RATE_WINDOW.as_secs(), env = "SIGNAGE_RATE_WINDOW")]
    pub rate_window: u64,

    /// Maximum number of rate-limit windows kept in memory.
    #[arg(long, default_value_t = DEFAULT_MAX_TRACKED_KEYS, env = "SIGNAGE_RATE_LIMIT_KEYS")]
    pub rate_limit_keys: usize,

    /// Timeout for a single rate-limit store call, in milliseconds.
    #[arg(
        long,
        default_value_t = DEFAULT_STORE_TIMEOUT.as_millis() as u64,
        env = "SIGNAGE_STORE_TIMEOUT_MS"
    )]
    pub store_timeout_ms: u64,

    /// Behavior when the rate-limit store is unavailable.
    #[arg(long, value_enum, default_value_t = FailMode::Closed, env = "SIGNAGE_FAIL_MODE")]
    pub fail_mode: FailMode,

    // =========================================================================
    // HTTP
    // =========================================================================
    /// Cache-Control max-age for thumbnails, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "SIGNAGE_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "SIGNAGE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_secret(self.auth_secret.as_deref())?;

        check_range("session_ttl", self.session_ttl, MAX_SESSION_TTL_SECS)?;
        check_range("rate_window", self.rate_window, MAX_RATE_WINDOW_SECS)?;
        check_range("store_timeout_ms", self.store_timeout_ms, MAX_STORE_TIMEOUT_MS)?;
        if self.rate_limit_keys == 0 {
            return Err("rate_limit_keys must be greater than 0".to_string());
        }
        if !self.landing_page.starts_with('/') {
            return Err("landing_page must be an absolute path starting with '/'".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_secret_or_empty(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or("")
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }

    pub fn rate_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.rate_limit, Duration::from_secs(self.rate_window))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TokenConfig {
    /// User the token is issued for.
    #[arg(long)]
    pub user: String,

    /// Token lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    pub ttl: u64,

    /// Secret key; must match the server's.
    #[arg(long, env = "SIGNAGE_AUTH_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_secret(self.secret.as_deref())?;
        if !is_valid_user_name(&self.user) {
            return Err(format!("'{}' is not a valid user name", self.user));
        }
        check_range("ttl", self.ttl, MAX_TOKEN_TTL_SECS)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

#[derive(Args, Debug, Clone)]
pub struct HashPasswordConfig {
    /// Password to hash. Read from stdin when omitted.
    #[arg(long, env = "SIGNAGE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// `value` must be in `1..=max`.
fn check_range(name: &str, value: u64, max: u64) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{} must be greater than 0", name));
    }
    if value > max {
        return Err(format!("{} must be at most {}", name, max));
    }
    Ok(())
}

fn validate_secret(secret: Option<&str>) -> Result<(), String> {
    match secret {
        None | Some("") => Err(
            "No auth secret provided. Set --auth-secret or SIGNAGE_AUTH_SECRET".to_string(),
        ),
        Some(s) if s.len() < MIN_SECRET_LEN => Err(format!(
            "auth secret must be at least {} bytes long",
            MIN_SECRET_LEN
        )),
        Some(_) => Ok(()),
    }
}

// =============================================================================
// Tests
// =============================================================================
