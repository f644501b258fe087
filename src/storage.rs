//! Flat-file JSON record store.
//!
//! One pretty-printed JSON array per collection under the data
//! directory, lazily created with seed records on first access. Every
//! operation is a full read-modify-write of the file and is attempted
//! exactly once; concurrent writers to the same collection are
//! last-writer-wins. That race is a known boundary of this layer, not
//! mitigated here.

use crate::errors::HttpError;
use crate::ids::RecordId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored collection is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("record {0} not found")]
    NotFound(RecordId),
}

impl From<StorageError> for HttpError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => HttpError::not_found(format!("record {id} not found")),
            other => HttpError::internal(other.to_string()),
        }
    }
}

/// A storable entity. `Draft` is the record minus its identifier; the
/// store assigns a fresh id on insert.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    type Draft;

    fn id(&self) -> &RecordId;
    fn from_draft(draft: Self::Draft, id: RecordId) -> Self;
}

/// A single flat-file collection of records.
pub struct Database<T: Record> {
    path: PathBuf,
    seed: Vec<T>,
}

impl<T: Record> Database<T> {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, collection: &str, seed: Vec<T>) -> Self {
        let path = data_dir.into().join(format!("{collection}.json"));
        Database { path, seed }
    }

    fn ensure_initialized(&self) -> Result<(), StorageError> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, serde_json::to_string_pretty(&self.seed)?)?;
            info!(
                path = %self.path.display(),
                records = self.seed.len(),
                "collection initialized"
            );
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<T>, StorageError> {
        self.ensure_initialized()?;
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn persist(&self, records: &[T]) -> Result<(), StorageError> {
        fs::write(&self.path, serde_json::to_string_pretty(records)?)?;
        Ok(())
    }

    /// All records in insertion order.
    ///
    /// # Errors
    ///
    /// `Io` or `Serde` when the collection file is unreadable.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.load()
    }

    /// Look up one record by id.
    ///
    /// # Errors
    ///
    /// `Io` or `Serde` when the collection file is unreadable.
    pub fn read(&self, id: &RecordId) -> Result<Option<T>, StorageError> {
        Ok(self.load()?.into_iter().find(|record| record.id() == id))
    }

    /// Append a record built from `draft` with a freshly assigned id,
    /// returning that id.
    ///
    /// # Errors
    ///
    /// `Io` or `Serde` when the collection cannot be read or written.
    pub fn insert(&self, draft: T::Draft) -> Result<RecordId, StorageError> {
        let mut records = self.load()?;
        let id = RecordId::new();
        records.push(T::from_draft(draft, id));
        self.persist(&records)?;
        Ok(id)
    }

    /// Replace the stored record with the same id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no stored record carries the id.
    pub fn update(&self, record: T) -> Result<(), StorageError> {
        let mut records = self.load()?;
        let id = *record.id();
        match records.iter_mut().find(|stored| *stored.id() == id) {
            Some(slot) => *slot = record,
            None => return Err(StorageError::NotFound(id)),
        }
        self.persist(&records)
    }

    /// Remove the record with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no stored record carries the id.
    pub fn delete(&self, id: &RecordId) -> Result<(), StorageError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Err(StorageError::NotFound(*id));
        }
        self.persist(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: RecordId,
        text: String,
    }

    struct NoteDraft {
        text: String,
    }

    impl Record for Note {
        type Draft = NoteDraft;

        fn id(&self) -> &RecordId {
            &self.id
        }

        fn from_draft(draft: NoteDraft, id: RecordId) -> Self {
            Note {
                id,
                text: draft.text,
            }
        }
    }

    fn temp_db(seed: Vec<Note>) -> (tempfile::TempDir, Database<Note>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path(), "notes", seed);
        (dir, db)
    }

    #[test]
    fn test_seed_data_appears_on_first_read() {
        let seeded = Note {
            id: RecordId::new(),
            text: "hello".to_string(),
        };
        let (_dir, db) = temp_db(vec![seeded.clone()]);
        assert_eq!(db.read_all().unwrap(), vec![seeded]);
    }

    #[test]
    fn test_insert_assigns_id_and_round_trips() {
        let (_dir, db) = temp_db(Vec::new());
        let id = db
            .insert(NoteDraft {
                text: "first".to_string(),
            })
            .unwrap();
        let stored = db.read(&id).unwrap().unwrap();
        assert_eq!(stored.text, "first");
        assert_eq!(stored.id, id);
    }

    #[test]
    fn test_update_replaces_matching_record() {
        let (_dir, db) = temp_db(Vec::new());
        let id = db
            .insert(NoteDraft {
                text: "old".to_string(),
            })
            .unwrap();
        db.update(Note {
            id,
            text: "new".to_string(),
        })
        .unwrap();
        assert_eq!(db.read(&id).unwrap().unwrap().text, "new");
    }

    #[test]
    fn test_update_absent_id_errors() {
        let (_dir, db) = temp_db(Vec::new());
        let err = db
            .update(Note {
                id: RecordId::new(),
                text: "ghost".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_only_matching_record() {
        let (_dir, db) = temp_db(Vec::new());
        let keep = db
            .insert(NoteDraft {
                text: "keep".to_string(),
            })
            .unwrap();
        let drop = db
            .insert(NoteDraft {
                text: "drop".to_string(),
            })
            .unwrap();
        db.delete(&drop).unwrap();
        let remaining = db.read_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(*remaining[0].id(), keep);
        assert!(matches!(
            db.delete(&drop).unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: HttpError = StorageError::NotFound(RecordId::new()).into();
        assert_eq!(err.status_code(), 404);
    }
}
