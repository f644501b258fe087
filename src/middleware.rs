//! Hooks around handler invocation.

use std::time::Duration;

use tracing::info;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Runs around every request a handler coroutine processes. A `Some`
/// response from `before` short-circuits the handler and is sent
/// unwrapped (no success envelope).
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Structured request/completion events for every dispatched request.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        info!(
            method = %req.method,
            path = %req.path,
            handler = %req.handler_name,
            "request dispatched"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        info!(
            handler = %req.handler_name,
            status = res.status,
            latency_us = latency.as_micros() as u64,
            "request completed"
        );
    }
}
