//! The users routes: five operations built with the fluent route
//! builder, each closing over the shared repository.

use super::model::{NewUser, UserPatch};
use super::repository::UserRepository;
use crate::errors::HttpError;
use crate::ids::RecordId;
use crate::storage::StorageError;
use crate::typed::{to_json, BaseResponse, HandlerDescriptor, TypedRoutes};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

pub struct UserController {
    repo: Arc<UserRepository>,
}

impl UserController {
    #[must_use]
    pub fn new(repo: Arc<UserRepository>) -> Self {
        UserController { repo }
    }

    /// All route descriptors of this controller, in declaration order.
    /// Registration consumes the list exactly once.
    #[must_use]
    pub fn routes(&self) -> Vec<HandlerDescriptor> {
        let route = TypedRoutes::with_base("/users");
        vec![
            self.get_all(&route),
            self.get(&route),
            self.create(&route),
            self.update(&route),
            self.delete(&route),
        ]
    }

    /// Read the list of users.
    fn get_all(&self, route: &TypedRoutes) -> HandlerDescriptor {
        let repo = Arc::clone(&self.repo);
        route.get("/").handler(move |_ctx| {
            let users = repo.get_all()?;
            Ok(BaseResponse::new().with("data", to_json(&users)?))
        })
    }

    /// Read a single user.
    fn get(&self, route: &TypedRoutes) -> HandlerDescriptor {
        let repo = Arc::clone(&self.repo);
        route
            .get("/:id")
            .params_schema(id_params_schema())
            .handler(move |ctx| {
                let params: IdParams = ctx.params_as()?;
                let id = parse_user_id(&params.id)?;
                let user = repo
                    .get(&id)?
                    .ok_or_else(|| HttpError::not_found("User not found"))?;
                Ok(BaseResponse::new().with("data", to_json(&user)?))
            })
    }

    /// Create a new user. Responds with the stored record so the
    /// assigned id round-trips to the caller.
    fn create(&self, route: &TypedRoutes) -> HandlerDescriptor {
        let repo = Arc::clone(&self.repo);
        route
            .post("/")
            .body_schema(new_user_schema())
            .handler(move |ctx| {
                let input: NewUser = ctx.body_as()?;
                let id = repo.create(input)?;
                let user = repo
                    .get(&id)?
                    .ok_or_else(|| HttpError::internal("created record missing"))?;
                Ok(BaseResponse::new()
                    .message("User created successfully")
                    .with("data", to_json(&user)?))
            })
    }

    /// Update a user: supplied fields overwrite, the rest stay.
    fn update(&self, route: &TypedRoutes) -> HandlerDescriptor {
        let repo = Arc::clone(&self.repo);
        route
            .put("/:id")
            .params_schema(id_params_schema())
            .body_schema(user_patch_schema())
            .handler(move |ctx| {
                let params: IdParams = ctx.params_as()?;
                let patch: UserPatch = ctx.body_as()?;
                let id = parse_user_id(&params.id)?;
                let mut user = repo
                    .get(&id)?
                    .ok_or_else(|| HttpError::not_found("User not found"))?;
                user.apply(patch);
                repo.update(user).map_err(not_found_as_user)?;
                Ok(BaseResponse::new().message("User updated successfully"))
            })
    }

    /// Delete a user.
    fn delete(&self, route: &TypedRoutes) -> HandlerDescriptor {
        let repo = Arc::clone(&self.repo);
        route
            .delete("/:id")
            .params_schema(id_params_schema())
            .handler(move |ctx| {
                let params: IdParams = ctx.params_as()?;
                let id = parse_user_id(&params.id)?;
                repo.delete(&id).map_err(not_found_as_user)?;
                Ok(BaseResponse::new().message("User deleted successfully"))
            })
    }
}

// An id that does not even parse can only belong to a record that does
// not exist.
fn parse_user_id(raw: &str) -> Result<RecordId, HttpError> {
    raw.parse()
        .map_err(|_| HttpError::not_found("User not found"))
}

fn not_found_as_user(err: StorageError) -> HttpError {
    match err {
        StorageError::NotFound(_) => HttpError::not_found("User not found"),
        other => other.into(),
    }
}

fn id_params_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" }
        },
        "required": ["id"]
    })
}

fn new_user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "username": { "type": "string" },
            "email": { "type": "string", "format": "email" },
            "password": { "type": "string" }
        },
        "required": ["username", "email", "password"]
    })
}

fn user_patch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "username": { "type": "string" },
            "email": { "type": "string", "format": "email" },
            "password": { "type": "string" }
        }
    })
}
