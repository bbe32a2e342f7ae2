use thiserror::Error;

use crate::docstore::CollectionError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph record was not updated: {txid} (token: {token_id})")]
    GraphUpsertRejected { txid: String, token_id: String },

    #[error("Attempted to add confirmed transaction without block reference: {txid}")]
    MissingBlockRef { txid: String },

    #[error("Index creation failed on {collection} ({field}): {source}")]
    Index {
        collection: String,
        field: String,
        #[source]
        source: CollectionError,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
