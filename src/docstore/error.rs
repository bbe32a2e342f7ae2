use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid collection name: {0}")]
    InvalidName(String),

    #[error("Duplicate key in {collection} (index {index}): {key}")]
    DuplicateKey {
        collection: String,
        index: String,
        key: String,
    },

    #[error("Index {index} on {collection} already exists with different options")]
    IndexConflict { collection: String, index: String },

    #[error("Bulk write to {collection} failed for {} document(s), {inserted} inserted", failures.len())]
    BulkWrite {
        collection: String,
        inserted: usize,
        failures: Vec<WriteFailure>,
    },

    #[error("Document is not an object")]
    NotAnObject,
}

impl CollectionError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, CollectionError::DuplicateKey { .. })
    }
}

/// A single rejected document inside a bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Position of the document in the submitted batch
    pub index: usize,
    pub kind: WriteFailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFailureKind {
    DuplicateKey { index: String, key: String },
    Other(String),
}

impl WriteFailure {
    pub fn from_error(index: usize, err: &CollectionError) -> Self {
        let kind = match err {
            CollectionError::DuplicateKey { index, key, .. } => WriteFailureKind::DuplicateKey {
                index: index.clone(),
                key: key.clone(),
            },
            other => WriteFailureKind::Other(other.to_string()),
        };
        Self { index, kind }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self.kind, WriteFailureKind::DuplicateKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, CollectionError>;
