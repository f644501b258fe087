use super::request::parse_request;
use super::response::{write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;
use crate::router::Router;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;

/// The HTTP service: parses the raw request, matches it against the
/// route table, dispatches to the handler coroutine and writes the
/// reply. Route table and dispatcher are built once at startup; clones
/// share the underlying handler channels.
#[derive(Clone)]
pub struct AppService {
    pub router: Router,
    pub dispatcher: Dispatcher,
}

impl AppService {
    #[must_use]
    pub fn new(router: Router, dispatcher: Dispatcher) -> Self {
        Self { router, dispatcher }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(res, 200, json!({ "status": "ok" }));
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        if parsed.method == "GET" && parsed.path == "/health" {
            return health_endpoint(res);
        }

        let method: Method = match parsed.method.parse() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(
                    res,
                    400,
                    json!({ "success": false, "message": "Unsupported method" }),
                );
                return Ok(());
            }
        };

        match self.router.route(method, &parsed.path) {
            Some(mut route_match) => {
                route_match.query_params = parsed.query_params;
                match self
                    .dispatcher
                    .dispatch(route_match, parsed.headers, parsed.body)
                {
                    Some(reply) => write_handler_response(res, reply.status, reply.body),
                    None => {
                        // Handler coroutine is gone or was never spawned.
                        write_json_error(
                            res,
                            500,
                            json!({
                                "success": false,
                                "message": "Handler failed or not registered"
                            }),
                        );
                    }
                }
            }
            None => {
                write_json_error(
                    res,
                    404,
                    json!({ "success": false, "message": "Not Found" }),
                );
            }
        }
        Ok(())
    }
}
