//! The built-in pipeline modules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::{AcceptedMethods, CredentialVerifier};
use crate::error::ApiError;
use crate::ratelimit::{CallerKey, RateLimitKey, RateLimitPolicy, RateLimiter};
use crate::schema::{ParamSource, Schema};

use super::context::RequestContext;

/// Position of a module in the pipeline. Modules run in ascending stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Authentication,
    RateLimiting,
    Validation,
    Authorization,
}

/// One step of an endpoint pipeline.
///
/// A module either contributes to the context and returns `Ok(())`, or fails
/// and stops the pipeline.
#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    async fn process(&self, ctx: &mut RequestContext) -> Result<(), ApiError>;
}

// =============================================================================
// Authentication
// =============================================================================

/// Resolves the caller's [`Principal`](crate::auth::Principal).
pub struct AuthModule {
    verifier: Arc<CredentialVerifier>,
    accepted: AcceptedMethods,
}

impl AuthModule {
    pub fn new(verifier: Arc<CredentialVerifier>, accepted: AcceptedMethods) -> Self {
        Self { verifier, accepted }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn stage(&self) -> Stage {
        Stage::Authentication
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let principal = self
            .verifier
            .verify(&ctx.request().headers, self.accepted)
            .await?;
        debug!(
            user = %principal.user(),
            method = principal.method().as_str(),
            "Authenticated"
        );
        ctx.set_principal(principal);
        Ok(())
    }
}

// =============================================================================
// Rate Limiting
// =============================================================================

/// Counts the request against the caller's budget for a route.
///
/// Authenticated callers are counted by user name, anonymous ones by peer IP.
pub struct RateLimitModule {
    limiter: RateLimiter,
    route: Arc<str>,
    policy: Option<RateLimitPolicy>,
}

impl RateLimitModule {
    /// Use the limiter's default policy for `route`.
    pub fn new(limiter: RateLimiter, route: impl Into<Arc<str>>) -> Self {
        Self {
            limiter,
            route: route.into(),
            policy: None,
        }
    }

    /// Override the policy for this route.
    pub fn with_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    fn caller(ctx: &RequestContext) -> CallerKey {
        match (ctx.principal(), ctx.request().peer) {
            (Some(principal), _) => CallerKey::User(principal.user().to_string()),
            (None, Some(ip)) => CallerKey::Ip(ip.to_string()),
            (None, None) => CallerKey::Ip("unknown".to_string()),
        }
    }
}

#[async_trait]
impl Module for RateLimitModule {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn stage(&self) -> Stage {
        Stage::RateLimiting
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let key = RateLimitKey::new(Self::caller(ctx), self.route.clone());
        let policy = self.policy.unwrap_or_else(|| self.limiter.policy());
        let decision = self.limiter.check(&key, policy).await?;
        debug!(key = %key, remaining = decision.remaining, "Rate limit ok");
        Ok(())
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Checks request parameters against a [`Schema`].
pub struct ValidatorModule {
    schema: Schema,
    source: ParamSource,
}

impl ValidatorModule {
    pub fn new(schema: Schema, source: ParamSource) -> Self {
        Self { schema, source }
    }

    pub fn query(schema: Schema) -> Self {
        Self::new(schema, ParamSource::Query)
    }

    pub fn body(schema: Schema) -> Self {
        Self::new(schema, ParamSource::Body)
    }
}

#[async_trait]
impl Module for ValidatorModule {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn stage(&self) -> Stage {
        Stage::Validation
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let params = match self.source {
            ParamSource::Query => self.schema.validate_query(ctx.request().query_str()),
            ParamSource::Body => self.schema.validate_body(&ctx.request().body),
        }?;
        ctx.set_params(params);
        Ok(())
    }
}

// =============================================================================
// Authorization
// =============================================================================

/// Admits only principals in one of the listed groups.
pub struct GroupModule {
    groups: Vec<String>,
    message: String,
}

impl GroupModule {
    pub fn new<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            message: "User not authorized for this operation.".to_string(),
        }
    }

    /// Message returned when the caller is rejected.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

#[async_trait]
impl Module for GroupModule {
    fn name(&self) -> &'static str {
        "groups"
    }

    fn stage(&self) -> Stage {
        Stage::Authorization
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let Some(principal) = ctx.principal() else {
            return Err(ApiError::Unauthorized("Not authenticated.".to_string()));
        };

        let allowed: Vec<&str> = self.groups.iter().map(String::as_str).collect();
        if principal.is_in_group(&allowed) {
            return Ok(());
        }

        warn!(
            user = %principal.user(),
            groups = ?principal.groups(),
            "Caller is not in any permitted group"
        );
        Err(ApiError::Forbidden(self.message.clone()))
    }
}
