use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, field, info_span, Instrument, Span};

use crate::error::ApiError;

use super::context::{ApiResponse, RequestContext, RequestDescriptor};
use super::modules::Module;

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Business logic at the end of a pipeline.
///
/// Implemented for async closures taking the [`RequestContext`].
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: RequestContext) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
{
    async fn handle(&self, ctx: RequestContext) -> Result<ApiResponse, ApiError> {
        (self)(ctx).await
    }
}

/// A module chain plus its handler.
///
/// Modules always run in [`Stage`](super::Stage) order, whatever order they
/// were registered in. Modules of the same stage keep registration order.
pub struct Endpoint {
    name: String,
    modules: Vec<Box<dyn Module>>,
    handler: Box<dyn Handler>,
    body_limit: usize,
}

impl Endpoint {
    pub fn builder(name: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            name: name.into(),
            modules: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Module names in execution order.
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Process one request through the modules and the handler.
    ///
    /// The first failing module ends the run; nothing after it executes.
    pub async fn run(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let span = info_span!(
            "pipeline",
            endpoint = %self.name,
            method = %request.method,
            user = field::Empty,
        );
        self.run_inner(request, span.clone()).instrument(span).await
    }

    async fn run_inner(
        &self,
        request: RequestDescriptor,
        span: Span,
    ) -> Result<ApiResponse, ApiError> {
        if request.body.len() > self.body_limit {
            return Err(ApiError::invalid(format!(
                "Request body exceeds {} bytes.",
                self.body_limit
            )));
        }

        let mut ctx = RequestContext::new(request);

        for module in &self.modules {
            if let Err(err) = module.process(&mut ctx).await {
                debug!(module = module.name(), "Pipeline stopped: {}", err);
                return Err(err);
            }
            if let Some(principal) = ctx.principal() {
                span.record("user", principal.user());
            }
        }

        self.handler.handle(ctx).await
    }
}

/// Collects modules for an [`Endpoint`].
pub struct EndpointBuilder {
    name: String,
    modules: Vec<Box<dyn Module>>,
    body_limit: usize,
}

impl EndpointBuilder {
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Attach the handler and fix the module order.
    pub fn handler(mut self, handler: impl Handler + 'static) -> Endpoint {
        self.modules.sort_by_key(|m| m.stage());
        Endpoint {
            name: self.name,
            modules: self.modules,
            handler: Box::new(handler),
            body_limit: self.body_limit,
        }
    }
}
