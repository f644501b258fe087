//! Fluent route definition.
//!
//! A [`TypedRoutes`] value hands out one [`RouteBuilder`] per
//! (method, path) pair. The builder accumulates optional per-stage
//! schemas - in any order, later calls overwrite earlier ones - and
//! `handler()` compiles everything into an immutable
//! [`HandlerDescriptor`]: the unit the dispatcher registers.
//!
//! The compiled invocation wrapper validates the three stages in the
//! fixed order of [`crate::schema`] before the business handler runs, so
//! a handler never observes input that failed its declared schema. The
//! handler's [`BaseResponse`] passes through unmodified; so does any
//! error the handler itself raises - only validation failures are
//! synthesized here.

use crate::dispatcher::{HandlerRequest, RouteHandlerFn};
use crate::errors::HttpError;
use crate::schema::{SchemaSet, Stage, StageSchema};
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Open JSON record a business handler returns.
///
/// Arbitrary keys; a handler-supplied `message` overrides the envelope
/// default when the dispatcher wraps the response.
#[derive(Debug, Clone, Default)]
pub struct BaseResponse(Map<String, Value>);

impl BaseResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key on the response record.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Set the `message` key, overriding the envelope default.
    #[must_use]
    pub fn message(self, message: impl Into<String>) -> Self {
        self.with("message", Value::String(message.into()))
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Serialize a response payload, mapping failure to a 500.
///
/// # Errors
///
/// `HttpError::Internal` when the value does not serialize.
pub fn to_json<T: Serialize>(value: &T) -> Result<Value, HttpError> {
    serde_json::to_value(value)
        .map_err(|e| HttpError::internal(format!("response serialization failed: {e}")))
}

/// Validated request data handed to a business handler.
///
/// Each stage slot is `Some` exactly when the route declared a schema for
/// it; the value already passed validation and coercion. The raw request
/// rides along for anything the schemas did not cover (headers, raw
/// param maps).
pub struct RequestContext {
    pub query: Option<Value>,
    pub params: Option<Value>,
    pub body: Option<Value>,
    pub request: HandlerRequest,
}

impl RequestContext {
    /// Deserialize the validated query value.
    ///
    /// # Errors
    ///
    /// `HttpError::Internal` - the value already passed validation, so a
    /// mismatch is a route-definition bug, not a client error.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        stage_as(self.query.clone(), Stage::Query)
    }

    /// Deserialize the validated path-params value.
    ///
    /// # Errors
    ///
    /// `HttpError::Internal` on a shape mismatch (route-definition bug).
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        stage_as(self.params.clone(), Stage::Params)
    }

    /// Deserialize the validated body value.
    ///
    /// # Errors
    ///
    /// `HttpError::Internal` on a shape mismatch (route-definition bug).
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        stage_as(self.body.clone(), Stage::Body)
    }
}

fn stage_as<T: DeserializeOwned>(value: Option<Value>, stage: Stage) -> Result<T, HttpError> {
    serde_json::from_value(value.unwrap_or(Value::Null))
        .map_err(|e| HttpError::internal(format!("{stage} value did not deserialize: {e}")))
}

/// Compiled, immutable record of one route: method, path and the wrapped
/// handler, ready for registration. Created once at route-definition
/// time, consumed exactly once by the dispatcher.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub method: Method,
    pub path: String,
    pub handler: Arc<RouteHandlerFn>,
}

/// Entry point for fluent route definition, one per controller.
///
/// Paths handed to `get`/`post`/`put`/`delete` are joined onto the base
/// path, so a controller mounted at `/users` declares `"/"` and `"/:id"`.
#[derive(Debug, Clone, Default)]
pub struct TypedRoutes {
    base_path: String,
}

impl TypedRoutes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base(base_path: impl Into<String>) -> Self {
        TypedRoutes {
            base_path: base_path.into(),
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::GET, self.join(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::POST, self.join(path))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::PUT, self.join(path))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::DELETE, self.join(path))
    }

    /// Builder for any other verb.
    #[must_use]
    pub fn on(&self, method: Method, path: &str) -> RouteBuilder {
        RouteBuilder::new(method, self.join(path))
    }

    fn join(&self, path: &str) -> String {
        if self.base_path.is_empty() {
            return path.to_string();
        }
        if path == "/" || path.is_empty() {
            return self.base_path.clone();
        }
        format!("{}{}", self.base_path, path)
    }
}

/// Accumulates one route's schemas before the handler compiles the
/// descriptor. Each schema setter is overwriting and order-independent.
pub struct RouteBuilder {
    method: Method,
    path: String,
    schemas: SchemaSet,
}

impl RouteBuilder {
    fn new(method: Method, path: String) -> Self {
        RouteBuilder {
            method,
            path,
            schemas: SchemaSet::default(),
        }
    }

    /// Attach a query-string schema. Panics at startup on an invalid
    /// schema literal.
    #[must_use]
    pub fn query_schema(mut self, schema: Value) -> Self {
        self.schemas.query = Some(StageSchema::compile(schema));
        self
    }

    /// Attach a path-params schema. Panics at startup on an invalid
    /// schema literal.
    #[must_use]
    pub fn params_schema(mut self, schema: Value) -> Self {
        self.schemas.params = Some(StageSchema::compile(schema));
        self
    }

    /// Attach a body schema. Panics at startup on an invalid schema
    /// literal.
    #[must_use]
    pub fn body_schema(mut self, schema: Value) -> Self {
        self.schemas.body = Some(StageSchema::compile(schema));
        self
    }

    /// Compile the descriptor. The returned handler validates query,
    /// params and body in that order, fail-fast, then invokes `handler`
    /// with the typed context.
    #[must_use]
    pub fn handler<F>(self, handler: F) -> HandlerDescriptor
    where
        F: Fn(RequestContext) -> Result<BaseResponse, HttpError> + Send + Sync + 'static,
    {
        let RouteBuilder {
            method,
            path,
            schemas,
        } = self;
        let wrapped = move |req: HandlerRequest| -> Result<BaseResponse, HttpError> {
            let stages = schemas.validate(&req.query_params, &req.path_params, req.body.as_ref())?;
            handler(RequestContext {
                query: stages.query,
                params: stages.params,
                body: stages.body,
                request: req,
            })
        };
        HandlerDescriptor {
            method,
            path,
            handler: Arc::new(wrapped),
        }
    }
}
