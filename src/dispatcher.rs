//! Coroutine-based request dispatch.
//!
//! Every registered route gets its own coroutine consuming a channel of
//! [`HandlerRequest`]s. The loop around the handler is where the layer's
//! two cross-cutting contracts live:
//!
//! - **Envelope**: a successful handler result is merged over
//!   `{"success": true, "message": "Request successful"}` - handler keys
//!   win - and sent with status 200. Every successful route response in
//!   the service has this shape.
//! - **Failure translation**: a classified [`HttpError`] becomes
//!   `{"success": false, "message"}` with the error's status; a panic
//!   becomes a generic 500. Handlers never write statuses themselves.
//!
//! Registration is one-shot at startup. Bulk registration walks an
//! explicit descriptor list in declaration order; manual registration
//! (`get`/`post`/`put`/`delete`) additionally takes an ordered per-route
//! middleware chain that runs, unwrapped, ahead of the terminal handler.

use crate::errors::HttpError;
use crate::middleware::Middleware;
use crate::router::{RouteMatch, Router};
use crate::typed::{BaseResponse, HandlerDescriptor};
use http::Method;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{error, info};

/// A request as delivered to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// The matched route pattern (e.g. `/users/:id`), not the raw path.
    pub path: String,
    pub handler_name: String,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

/// The wrapped handler stored in a descriptor: stage validation plus the
/// business handler, compiled by the route builder.
pub type RouteHandlerFn =
    dyn Fn(HandlerRequest) -> Result<BaseResponse, HttpError> + Send + Sync;

pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Key a route registers under: its method and pattern.
#[must_use]
pub fn route_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

/// Merge a handler result over the uniform success envelope. Handler
/// keys override the defaults, including `message`.
#[must_use]
pub fn envelope(result: BaseResponse) -> Value {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(true));
    out.insert(
        "message".to_string(),
        Value::String("Request successful".to_string()),
    );
    for (key, value) in result.into_map() {
        out.insert(key, value);
    }
    Value::Object(out)
}

#[derive(Clone, Default)]
pub struct Dispatcher {
    pub handlers: HashMap<String, HandlerSender>,
    middlewares: Arc<RwLock<Vec<Arc<dyn Middleware>>>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Append a middleware that runs around every handler, in the order
    /// added and ahead of any per-route chain.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares
            .write()
            .expect("middleware list poisoned")
            .push(middleware);
    }

    /// Register every descriptor in the list, in declaration order. Each
    /// descriptor yields exactly one route on `router` under its declared
    /// method and path.
    ///
    /// # Safety
    ///
    /// Spawns one coroutine per descriptor; the caller must ensure the
    /// may runtime is configured (stack size) before requests arrive and
    /// that handlers are safe to run concurrently.
    pub unsafe fn register_routes(
        &mut self,
        router: &mut Router,
        descriptors: Vec<HandlerDescriptor>,
    ) {
        for descriptor in descriptors {
            self.register(router, descriptor);
        }
    }

    /// Register a single descriptor.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Dispatcher::register_routes`].
    pub unsafe fn register(&mut self, router: &mut Router, descriptor: HandlerDescriptor) {
        let HandlerDescriptor {
            method,
            path,
            handler,
        } = descriptor;
        let name = route_key(&method, &path);
        info!(method = %method, path = %path, handler = %name, "registering route");
        router.add_route(method, &path, name.clone());
        self.spawn_handler(name, handler, Vec::new());
    }

    /// Manually register a GET route with an ordered middleware chain
    /// ahead of the terminal handler. Only the terminal handler receives
    /// the envelope wrapper.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Dispatcher::register_routes`].
    pub unsafe fn get<F>(
        &mut self,
        router: &mut Router,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: F,
    ) where
        F: Fn(HandlerRequest) -> Result<BaseResponse, HttpError> + Send + Sync + 'static,
    {
        self.route_with(router, Method::GET, path, middlewares, Arc::new(handler));
    }

    /// Manually register a POST route.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Dispatcher::register_routes`].
    pub unsafe fn post<F>(
        &mut self,
        router: &mut Router,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: F,
    ) where
        F: Fn(HandlerRequest) -> Result<BaseResponse, HttpError> + Send + Sync + 'static,
    {
        self.route_with(router, Method::POST, path, middlewares, Arc::new(handler));
    }

    /// Manually register a PUT route.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Dispatcher::register_routes`].
    pub unsafe fn put<F>(
        &mut self,
        router: &mut Router,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: F,
    ) where
        F: Fn(HandlerRequest) -> Result<BaseResponse, HttpError> + Send + Sync + 'static,
    {
        self.route_with(router, Method::PUT, path, middlewares, Arc::new(handler));
    }

    /// Manually register a DELETE route.
    ///
    /// # Safety
    ///
    /// Same requirements as [`Dispatcher::register_routes`].
    pub unsafe fn delete<F>(
        &mut self,
        router: &mut Router,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: F,
    ) where
        F: Fn(HandlerRequest) -> Result<BaseResponse, HttpError> + Send + Sync + 'static,
    {
        self.route_with(router, Method::DELETE, path, middlewares, Arc::new(handler));
    }

    unsafe fn route_with(
        &mut self,
        router: &mut Router,
        method: Method,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: Arc<RouteHandlerFn>,
    ) {
        let name = route_key(&method, path);
        info!(method = %method, path = %path, handler = %name, "registering route");
        router.add_route(method, path, name.clone());
        self.spawn_handler(name, handler, middlewares);
    }

    unsafe fn spawn_handler(
        &mut self,
        name: String,
        handler: Arc<RouteHandlerFn>,
        route_middlewares: Vec<Arc<dyn Middleware>>,
    ) {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let global = Arc::clone(&self.middlewares);

        may::coroutine::spawn(move || {
            for req in rx.iter() {
                let reply_tx = req.reply_tx.clone();
                let handler_name = req.handler_name.clone();
                let start = Instant::now();

                let chain: Vec<Arc<dyn Middleware>> = global
                    .read()
                    .expect("middleware list poisoned")
                    .iter()
                    .cloned()
                    .chain(route_middlewares.iter().cloned())
                    .collect();

                // A middleware response short-circuits the handler and is
                // sent as-is, without the envelope.
                let mut short_circuit = None;
                for middleware in &chain {
                    if let Some(response) = middleware.before(&req) {
                        short_circuit = Some(response);
                        break;
                    }
                }

                let mut response = match short_circuit {
                    Some(response) => response,
                    None => {
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(
                            || handler(req.clone()),
                        ));
                        match result {
                            Ok(Ok(body)) => HandlerResponse {
                                status: 200,
                                body: envelope(body),
                            },
                            Ok(Err(err)) => HandlerResponse {
                                status: err.status_code(),
                                body: err.to_body(),
                            },
                            Err(panic) => {
                                error!(handler = %handler_name, panic = ?panic, "handler panicked");
                                HandlerResponse {
                                    status: 500,
                                    body: json!({
                                        "success": false,
                                        "message": "Internal Server Error"
                                    }),
                                }
                            }
                        }
                    }
                };

                for middleware in &chain {
                    middleware.after(&req, &mut response, start.elapsed());
                }
                let _ = reply_tx.send(response);
            }
        });

        self.handlers.insert(name, tx);
    }

    /// Send a matched request to its handler coroutine and wait for the
    /// reply. `None` means the handler is not registered or its
    /// coroutine died; the server writes that as a 500.
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        headers: HashMap<String, String>,
        body: Option<Value>,
    ) -> Option<HandlerResponse> {
        let (reply_tx, reply_rx) = mpsc::channel();

        let tx = self.handlers.get(&route_match.handler_name)?;

        let request = HandlerRequest {
            method: route_match.route.method.clone(),
            path: route_match.route.path_pattern.clone(),
            handler_name: route_match.handler_name.clone(),
            path_params: route_match.path_params.clone(),
            query_params: route_match.query_params.clone(),
            headers,
            body,
            reply_tx,
        };

        tx.send(request).ok()?;
        reply_rx.recv().ok()
    }
}
