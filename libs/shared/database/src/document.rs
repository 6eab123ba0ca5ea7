use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Write precondition failed: {0}")]
    Conflict(String),

    #[error("Malformed document {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Store request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Request(err.to_string())
    }
}

/// A document read back from the store. `revision` is an opaque version
/// token; passing it back as a write precondition makes a
/// read-modify-write safe against concurrent writers.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub revision: Option<String>,
    pub data: Value,
}

impl Document {
    /// Schema boundary: documents are decoded into typed entities at the
    /// point of reading, never trusted as loose field bags.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Decode {
            path: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

pub fn encode<T: Serialize>(entity: &T) -> Result<Value, StoreError> {
    serde_json::to_value(entity).map_err(|e| StoreError::Decode {
        path: String::new(),
        reason: e.to_string(),
    })
}

/// Equality filter on a top-level document field.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Precondition {
    /// The document must not exist yet (creates).
    MustNotExist,
    /// The document must still carry this revision token.
    Revision(String),
}

/// One mutation inside an atomic batch. `Update` merges the given fields
/// into the existing document.
#[derive(Debug, Clone)]
pub enum Write {
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    Update {
        collection: String,
        id: String,
        data: Value,
        precondition: Option<Precondition>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl Write {
    pub fn create(collection: &str, id: &str, data: Value) -> Self {
        Write::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        }
    }

    pub fn update(collection: &str, id: &str, data: Value) -> Self {
        Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            precondition: None,
        }
    }

    pub fn update_guarded(collection: &str, id: &str, data: Value, revision: Option<String>) -> Self {
        Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            precondition: revision.map(Precondition::Revision),
        }
    }

    pub fn delete(collection: &str, id: &str) -> Self {
        Write::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// The generic document-store collaborator backing every cell. Collection
/// paths are slash-separated (`users/{id}/appointments`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError>;

    async fn create(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Apply all writes atomically; no write is applied when any
    /// precondition fails. This is the transactional primitive every
    /// multi-document mutation in the cells goes through.
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;
}
