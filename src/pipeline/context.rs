use std::net::IpAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::schema::ValidatedParams;

/// An incoming request, as seen by pipeline modules.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Peer address, when the transport knows it
    pub peer: Option<IpAddr>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            peer: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_peer(mut self, peer: IpAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}

/// Per-request state shared by the modules and the handler.
///
/// Modules fill it in order: authentication sets the principal, validation
/// sets the parameters.
#[derive(Debug)]
pub struct RequestContext {
    request: RequestDescriptor,
    principal: Option<Principal>,
    params: Option<ValidatedParams>,
}

impl RequestContext {
    pub fn new(request: RequestDescriptor) -> Self {
        Self {
            request,
            principal: None,
            params: None,
        }
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn params(&self) -> Option<&ValidatedParams> {
        self.params.as_ref()
    }

    pub fn set_params(&mut self, params: ValidatedParams) {
        self.params = Some(params);
    }

    /// The authenticated caller. Errors if no authentication module ran.
    pub fn require_principal(&self) -> Result<&Principal, ApiError> {
        self.principal
            .as_ref()
            .ok_or_else(|| ApiError::Internal("endpoint has no authentication module".to_string()))
    }

    /// Validated parameters deserialized into `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.params
            .as_ref()
            .ok_or_else(|| ApiError::Internal("endpoint has no validation module".to_string()))?
            .deserialize()
    }
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 200 with a JSON body
    Json(serde_json::Value),

    /// 200 with raw file bytes
    File {
        body: Bytes,
        content_type: String,
        cache_control: Option<String>,
    },
}

impl ApiResponse {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(ApiResponse::Json)
            .map_err(|e| ApiError::Internal(format!("failed to serialize response: {}", e)))
    }

    pub fn file(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        ApiResponse::File {
            body: body.into(),
            content_type: content_type.into(),
            cache_control: None,
        }
    }

    /// Set `Cache-Control` on a file response. No effect on JSON.
    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        if let ApiResponse::File { cache_control, .. } = &mut self {
            *cache_control = Some(value.into());
        }
        self
    }
}
