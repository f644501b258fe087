use super::model::{NewUser, User};
use crate::ids::RecordId;
use crate::storage::{Database, StorageError};

/// Thin access layer over the users collection.
pub struct UserRepository {
    db: Database<User>,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: Database<User>) -> Self {
        UserRepository { db }
    }

    pub fn get_all(&self) -> Result<Vec<User>, StorageError> {
        self.db.read_all()
    }

    pub fn get(&self, id: &RecordId) -> Result<Option<User>, StorageError> {
        self.db.read(id)
    }

    pub fn create(&self, input: NewUser) -> Result<RecordId, StorageError> {
        self.db.insert(input)
    }

    pub fn update(&self, user: User) -> Result<(), StorageError> {
        self.db.update(user)
    }

    pub fn delete(&self, id: &RecordId) -> Result<(), StorageError> {
        self.db.delete(id)
    }
}
