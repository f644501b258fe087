//! # Routekit
//!
//! **Routekit** is a small, coroutine-powered HTTP request-handling layer:
//! a fluent builder that attaches per-stage JSON-schema validation to
//! route handlers, and a dispatcher that registers the compiled routes,
//! wraps every response in a uniform envelope, and translates classified
//! failures into HTTP error responses.
//!
//! ## Architecture
//!
//! - **[`typed`]** - fluent route definition: `TypedRoutes` →
//!   `RouteBuilder` → `HandlerDescriptor`
//! - **[`schema`]** - per-stage validation (query → params → body,
//!   fail-fast) with string coercion and default filling
//! - **[`errors`]** - the `HttpError` taxonomy (Validation 400,
//!   NotFound 404, Internal 500, open status)
//! - **[`router`]** - regex route table over `:name` path patterns
//! - **[`dispatcher`]** - coroutine-per-handler dispatch, success
//!   envelope, failure translation, panic recovery
//! - **[`middleware`]** - before/after hooks around handler invocation
//! - **[`server`]** - HTTP plumbing on `may_minihttp`
//! - **[`storage`]** - flat-file JSON record store
//! - **[`users`]** - the users CRUD service built on all of the above
//!
//! ## The envelope contract
//!
//! Every successful route response is the handler's result merged over
//! `{"success": true, "message": "Request successful"}` with status 200;
//! handler keys (including `message`) win. Every classified failure is
//! `{"success": false, "message"}` with the error's status. Handlers
//! never write statuses themselves.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use routekit::dispatcher::Dispatcher;
//! use routekit::router::Router;
//! use routekit::server::{AppService, HttpServer};
//! use routekit::typed::{BaseResponse, TypedRoutes};
//!
//! let route = TypedRoutes::with_base("/hello");
//! let descriptors = vec![route.get("/").handler(|_ctx| Ok(BaseResponse::new()))];
//!
//! let mut router = Router::new();
//! let mut dispatcher = Dispatcher::new();
//! unsafe { dispatcher.register_routes(&mut router, descriptors) };
//!
//! let server = HttpServer(AppService::new(router, dispatcher))
//!     .start("0.0.0.0:8080")
//!     .unwrap();
//! server.join().unwrap();
//! ```
//!
//! ## Runtime considerations
//!
//! Routekit runs on the `may` coroutine runtime, not tokio. Handlers are
//! plain functions executed in lightweight coroutines; stack size is
//! configurable via `ROUTEKIT_STACK_SIZE`. Blocking I/O (the flat-file
//! store) is acceptable inside handlers at this layer's scale.

pub mod dispatcher;
pub mod errors;
pub mod ids;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod server;
pub mod storage;
pub mod typed;
pub mod users;

pub use errors::HttpError;
pub use typed::{BaseResponse, HandlerDescriptor, RequestContext, TypedRoutes};
