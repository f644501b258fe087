use crate::ids::RecordId;
use crate::storage::Record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A user before the store assigns its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial update: only supplied fields overwrite the stored record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Record for User {
    type Draft = NewUser;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(draft: NewUser, id: RecordId) -> Self {
        User {
            id,
            username: draft.username,
            email: draft.email,
            password: draft.password,
        }
    }
}

impl User {
    /// Merge a patch: unspecified fields stay untouched. The single
    /// update rule for this module.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
    }
}
