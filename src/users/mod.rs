//! Users module: model, flat-file repository, route controller and the
//! wiring between them.

pub mod controller;
pub mod model;
pub mod repository;

pub use controller::UserController;
pub use model::{NewUser, User, UserPatch};
pub use repository::UserRepository;

use crate::ids::RecordId;
use crate::storage::Database;
use crate::typed::HandlerDescriptor;
use std::path::Path;
use std::sync::Arc;

/// Wire the module: collection → repository → controller, returning the
/// route descriptors ready for registration.
#[must_use]
pub fn routes(data_dir: &Path) -> Vec<HandlerDescriptor> {
    let db = Database::new(data_dir, "users", seed_users());
    let repository = Arc::new(UserRepository::new(db));
    UserController::new(repository).routes()
}

fn seed_users() -> Vec<User> {
    vec![User {
        id: RecordId::new(),
        username: "firstuser".to_string(),
        email: "first@email.com".to_string(),
        password: "password".to_string(),
    }]
}
