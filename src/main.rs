//! Signage API - authenticated, rate-limited access to slide assets.
//!
//! This binary starts the HTTP server and provides small admin helpers.

use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signage_api::{
    auth::{hash_password, CredentialVerifier, SessionStore, TokenSigner, UserDirectory},
    config::{Cli, Command, HashPasswordConfig, ServeConfig, TokenConfig},
    ratelimit::{FailMode, MemoryRateLimitStore, RateLimiter},
    server::{create_router, AppState, RouterConfig, THUMBNAIL_ROUTE},
    slide::FsSlideStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Token(config) => run_token(config),
        Command::HashPassword(config) => run_hash_password(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let users = match UserDirectory::load(&config.users_file).await {
        Ok(users) => users,
        Err(e) => {
            error!("Failed to load users: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if users.is_empty() {
        warn!("Users file contains no users; nobody can log in");
    }

    if !config.slides_dir.is_dir() {
        warn!(
            "Slides directory {} does not exist; every slide lookup will fail",
            config.slides_dir.display()
        );
    }

    info!("Configuration:");
    info!("  Slides: {}", config.slides_dir.display());
    info!("  Users: {} loaded from {}", users.len(), config.users_file.display());
    info!("  Session TTL: {}s", config.session_ttl);
    info!(
        "  Rate limit: {} requests / {}s per caller and route",
        config.rate_limit, config.rate_window
    );
    match config.fail_mode {
        FailMode::Closed => info!("  Rate-limit store failures: reject (503)"),
        FailMode::Open => warn!("  Rate-limit store failures: ALLOW (fail-open)"),
    }

    let sessions = Arc::new(SessionStore::new(config.session_ttl()));
    let verifier = Arc::new(CredentialVerifier::new(
        TokenSigner::new(config.auth_secret_or_empty()),
        sessions.clone(),
        Arc::new(users),
    ));

    let limiter = RateLimiter::new(
        Arc::new(MemoryRateLimitStore::with_capacity(config.rate_limit_keys)),
        config.rate_policy(),
    )
    .with_timeout(config.store_timeout())
    .with_fail_mode(config.fail_mode);

    let slides = Arc::new(FsSlideStore::new(config.slides_dir.clone()));

    let state = AppState::new(verifier, limiter, slides);
    let router = create_router(state, build_router_config(&config));

    spawn_session_sweeper(sessions, config.session_ttl());

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -H 'Authorization: Bearer <token>' 'http://{}{}?id=<slide>&name=<asset>'",
        addr, THUMBNAIL_ROUTE
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let service = router.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "signage_api=debug,tower_http=debug"
    } else {
        "signage_api=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_landing_page(config.landing_page.clone())
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing)
        .with_secure_cookies(config.cookie_secure);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

/// Periodically drop expired sessions that were never looked up again.
fn spawn_session_sweeper(sessions: Arc<SessionStore>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                info!(purged, "Purged expired sessions");
            }
        }
    });
}

// =============================================================================
// Token Command
// =============================================================================

fn run_token(config: TokenConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let signer = TokenSigner::new(config.secret.as_deref().unwrap_or(""));
    match signer.issue(&config.user, config.ttl()) {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Hash Password Command
// =============================================================================

fn run_hash_password(config: HashPasswordConfig) -> ExitCode {
    let password = match config.password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            if let Err(e) = io::stdin().lock().read_line(&mut line) {
                eprintln!("Error: failed to read password from stdin: {}", e);
                return ExitCode::FAILURE;
            }
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        eprintln!("Error: password must not be empty");
        return ExitCode::FAILURE;
    }

    match hash_password(&password) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
