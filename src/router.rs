//! Route table and path matching.
//!
//! Routes are matched by anchored regexes compiled from `:name` path
//! patterns, scanned linearly in registration order - first match wins.
//! The table is built once at startup and never mutated afterwards.

use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable record of one registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteEntry>,
    pub handler_name: String,
    /// Path parameters extracted from the URL (e.g. `:id` → `{"id": "123"}`).
    pub path_params: HashMap<String, String>,
    /// Query string parameters (populated by the server).
    pub query_params: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<(Method, Regex, Arc<RouteEntry>, Vec<String>)>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Router::default()
    }

    /// Append a route to the table. Called once per descriptor during
    /// registration; order determines match precedence.
    pub fn add_route(&mut self, method: Method, path: &str, handler_name: String) {
        let (regex, param_names) = Self::path_to_regex(path);
        let entry = Arc::new(RouteEntry {
            method: method.clone(),
            path_pattern: path.to_string(),
            handler_name,
        });
        debug!(method = %method, path = %path, "route added");
        self.routes.push((method, regex, entry, param_names));
    }

    /// Match an HTTP request against the table.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        for (route_method, regex, entry, param_names) in &self.routes {
            if *route_method != method {
                continue;
            }
            if let Some(caps) = regex.captures(path) {
                let path_params = param_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        caps.get(i + 1).map(|m| (name.clone(), m.as_str().to_string()))
                    })
                    .collect();
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %entry.path_pattern,
                    handler = %entry.handler_name,
                    "route matched"
                );
                return Some(RouteMatch {
                    route: Arc::clone(entry),
                    handler_name: entry.handler_name.clone(),
                    path_params,
                    query_params: HashMap::new(),
                });
            }
        }
        warn!(method = %method, path = %path, "no route matched");
        None
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered patterns in registration order, for startup logging and
    /// tests.
    #[must_use]
    pub fn path_patterns(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|(method, _, entry, _)| format!("{} {}", method, entry.path_pattern))
            .collect()
    }

    /// Convert a `:name` path pattern to an anchored regex and the
    /// ordered list of parameter names.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
        if path == "/" {
            return (
                Regex::new(r"^/$").expect("failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches(':').count());

        for segment in path.split('/') {
            if let Some(name) = segment.strip_prefix(':') {
                pattern.push_str("/([^/]+)");
                param_names.push(name.to_string());
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(segment);
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("failed to compile path regex");

        (regex, param_names)
    }
}
