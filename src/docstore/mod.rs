//! Document collections on top of an embedded key-value store
//!
//! The ledger is written against the [`Database`] and [`Collection`] traits:
//! filter-based lookups, whole-document replace with upsert, unordered bulk
//! inserts with per-document failure reporting, and secondary indexes. The
//! bundled backend is [`FjallDatabase`], which keeps every collection in its
//! own Fjall partition.
//!
//! Single-document writes are atomic. Nothing spans documents or collections.

pub mod error;
pub mod filter;
pub mod keys;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::{CollectionError, Result, WriteFailure, WriteFailureKind};
pub use filter::Filter;
pub use store::{FjallCollection, FjallConnector, FjallDatabase};

/// Result of a replace-with-upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Documents matched by the filter (0 or 1)
    pub matched: u64,
    /// Documents whose content changed
    pub modified: u64,
    /// Id of the inserted document when the upsert created one
    pub upserted: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Ascending,
    Text,
}

/// Secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    pub kind: IndexKind,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field index, named `<field>_1`
    pub fn ascending(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: format!("{field}_1"),
            fields: vec![field],
            kind: IndexKind::Ascending,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Full-text index spanning `fields`, named `fulltext`
    pub fn text(fields: Vec<String>) -> Self {
        Self {
            name: "fulltext".to_string(),
            fields,
            kind: IndexKind::Text,
            unique: false,
        }
    }

    /// Field served by this index for equality lookups
    pub fn lookup_field(&self) -> Option<&str> {
        match self.kind {
            IndexKind::Ascending => self.fields.first().map(String::as_str),
            IndexKind::Text => None,
        }
    }
}

/// Opens a [`Database`]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Database>>;
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Handle to a collection, created on first use
    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// Remove every document and index from every collection
    async fn drop_database(&self) -> Result<()>;

    /// Flush pending writes; the handle must not be used afterwards
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>>;

    async fn find(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>>;

    async fn count(&self, filter: &Filter) -> Result<u64>;

    async fn insert_one(&self, doc: Value) -> Result<()>;

    /// Insert a batch. Ordered inserts stop at the first failure, unordered
    /// inserts attempt every document. Any failure is reported as
    /// [`CollectionError::BulkWrite`]. Returns the number inserted.
    async fn insert_many(&self, docs: Vec<Value>, ordered: bool) -> Result<usize>;

    /// Replace the first document matching `filter`, inserting `doc` when
    /// nothing matches and `upsert` is set
    async fn replace_one(&self, filter: &Filter, doc: Value, upsert: bool)
    -> Result<ReplaceOutcome>;

    /// Returns the number of documents removed
    async fn delete_many(&self, filter: &Filter) -> Result<u64>;

    async fn drop_collection(&self) -> Result<()>;

    /// Create an index, backfilling it over existing documents. Creating an
    /// identical index again is a no-op.
    async fn create_index(&self, spec: IndexSpec) -> Result<()>;

    async fn list_indexes(&self) -> Result<Vec<IndexSpec>>;
}
