//! End-to-end tests for the users service
//!
//! # Test Strategy
//!
//! Each test spins up the complete stack - flat-file store in a temp
//! directory, registered routes, real HTTP server on a random port -
//! and talks to it over raw TCP. The fixture cleans up via Drop.

mod common;
use common::http::{get_json, send_json};
use common::test_server::setup_may_runtime;

use routekit::dispatcher::Dispatcher;
use routekit::ids::RecordId;
use routekit::router::Router;
use routekit::server::{AppService, HttpServer, ServerHandle};
use routekit::users;
use serde_json::json;
use std::net::{SocketAddr, TcpListener};

struct UsersTestServer {
    _data_dir: tempfile::TempDir,
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl UsersTestServer {
    fn new() -> Self {
        setup_may_runtime();
        let data_dir = tempfile::tempdir().unwrap();

        let mut router = Router::new();
        let mut dispatcher = Dispatcher::new();
        unsafe {
            dispatcher.register_routes(&mut router, users::routes(data_dir.path()));
        }
        let service = AppService::new(router, dispatcher);

        // Bind to a random free port, then hand it to the server.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready().unwrap();

        UsersTestServer {
            _data_dir: data_dir,
            handle: Some(handle),
            addr,
        }
    }
}

impl Drop for UsersTestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_health_endpoint() {
    let server = UsersTestServer::new();
    let (status, body) = get_json(&server.addr, "/health");
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[test]
fn test_list_users_returns_seed_record() {
    let server = UsersTestServer::new();
    let (status, body) = get_json(&server.addr, "/users");
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Request successful");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["username"], "firstuser");
}

#[test]
fn test_create_then_get_round_trips() {
    let server = UsersTestServer::new();
    let input = json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "secret"
    });
    let (status, body) = send_json(&server.addr, "POST", "/users", &input);
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&server.addr, &format!("/users/{id}"));
    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["password"], "secret");
}

#[test]
fn test_create_with_bad_email_is_400_and_store_unchanged() {
    let server = UsersTestServer::new();
    let (status, body) = send_json(
        &server.addr,
        "POST",
        "/users",
        &json!({ "username": "a", "email": "not-an-email", "password": "x" }),
    );
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Body"), "message: {message}");
    assert!(message.contains("email"), "message: {message}");

    // Nothing was written.
    let (_, body) = get_json(&server.addr, "/users");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[test]
fn test_get_absent_user_is_404() {
    let server = UsersTestServer::new();
    let absent = RecordId::new().to_string();
    let (status, body) = get_json(&server.addr, &format!("/users/{absent}"));
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "success": false, "message": "User not found" }));

    // An id that is not even a ULID behaves the same.
    let (status, _) = get_json(&server.addr, "/users/not-a-real-id");
    assert_eq!(status, 404);
}

#[test]
fn test_update_merges_only_supplied_fields() {
    let server = UsersTestServer::new();
    let (_, body) = send_json(
        &server.addr,
        "POST",
        "/users",
        &json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }),
    );
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &server.addr,
        "PUT",
        &format!("/users/{id}"),
        &json!({ "email": "bob@new.example.com" }),
    );
    assert_eq!(status, 200);
    assert_eq!(body["message"], "User updated successfully");

    let (_, body) = get_json(&server.addr, &format!("/users/{id}"));
    assert_eq!(body["data"]["email"], "bob@new.example.com");
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["password"], "pw");
}

#[test]
fn test_update_absent_user_is_404() {
    let server = UsersTestServer::new();
    let absent = RecordId::new().to_string();
    let (status, body) = send_json(
        &server.addr,
        "PUT",
        &format!("/users/{absent}"),
        &json!({ "username": "ghost" }),
    );
    assert_eq!(status, 404);
    assert_eq!(body["message"], "User not found");
}

#[test]
fn test_delete_user() {
    let server = UsersTestServer::new();
    let (_, body) = send_json(
        &server.addr,
        "POST",
        "/users",
        &json!({ "username": "gone", "email": "gone@example.com", "password": "pw" }),
    );
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(&server.addr, "DELETE", &format!("/users/{id}"), &json!({}));
    assert_eq!(status, 200);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = get_json(&server.addr, &format!("/users/{id}"));
    assert_eq!(status, 404);
}

#[test]
fn test_unknown_route_is_404() {
    let server = UsersTestServer::new();
    let (status, body) = get_json(&server.addr, "/nope");
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "success": false, "message": "Not Found" }));
}
