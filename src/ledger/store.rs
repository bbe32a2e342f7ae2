use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::{IndexConfig, StoreConfig};
use crate::docstore::{
    Collection, CollectionError, Connector, Database, FjallConnector, Filter, IndexSpec,
};

use super::collections::{
    ANNOTATION_FIELD, CONFIRMED, GRAPHS, STATUSES, TOKENS, TXID_FIELD, UNCONFIRMED, block_filter,
    context_filter, graph_node_filter, graph_txid_filter, token_filter, txid_filter,
};
use super::error::{LedgerError, Result};
use super::pruning::retained_graph_filter;
use super::records::{GraphDelta, GraphRecord, StatusRecord, TokenRecord, TxnRecord};

/// Confirmed transactions are bulk inserted in chunks of this size
pub const CONFIRMED_INSERT_CHUNK: usize = 1000;

/// Persistence for confirmed/unconfirmed transactions, token graphs, token
/// metadata and checkpoints
///
/// The connection is opened on first use and shared by every operation until
/// [`LedgerStore::close`]. The store does no locking of its own: each single
/// document write is atomic, sequences of writes are not. Callers apply at most
/// one graph delta per token at a time.
pub struct LedgerStore {
    connector: Box<dyn Connector>,
    connection: Mutex<Option<Arc<dyn Database>>>,
}

/// Per-call counts from [`LedgerStore::apply_graph_delta`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphDeltaStats {
    pub inserted: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// Documents removed across graph, confirmed and unconfirmed
    pub purged: u64,
}

/// Per-call counts from [`LedgerStore::bulk_insert_confirmed`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkInsertStats {
    pub inserted: usize,
    pub duplicates: usize,
}

impl LedgerStore {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            connection: Mutex::new(None),
        }
    }

    /// Store backed by a Fjall keyspace at the configured path
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(FjallConnector::new(&config.path).with_cache_size(config.cache_size.as_u64()))
    }

    async fn database(&self) -> Result<Arc<dyn Database>> {
        let mut connection = self.connection.lock().await;
        if let Some(db) = connection.as_ref() {
            return Ok(Arc::clone(db));
        }

        info!("Connecting ledger store");
        let db = self.connector.connect().await?;
        *connection = Some(Arc::clone(&db));
        Ok(db)
    }

    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        Ok(self.database().await?.collection(name)?)
    }

    /// Wipe every collection (test/reindex use)
    pub async fn drop_database(&self) -> Result<()> {
        self.database().await?.drop_database().await?;
        Ok(())
    }

    /// Release the connection; the next call reconnects
    pub async fn close(&self) -> Result<()> {
        let connection = self.connection.lock().await.take();
        if let Some(db) = connection {
            db.close().await?;
        }
        Ok(())
    }

    // Status checkpoints

    /// Replace the checkpoint for `context`
    ///
    /// Delete then insert, not a transaction: a crash in between leaves no
    /// checkpoint, which callers treat as "start over".
    pub async fn save_status(&self, context: &str, state: Value) -> Result<()> {
        let statuses = self.collection(STATUSES).await?;
        let record = StatusRecord {
            context: context.to_string(),
            saved_at: Utc::now(),
            state,
        };
        statuses.delete_many(&context_filter(context)).await?;
        statuses.insert_one(serde_json::to_value(&record)?).await?;
        debug!(context, "Saved status checkpoint");
        Ok(())
    }

    pub async fn load_status(&self, context: &str) -> Result<Option<StatusRecord>> {
        self.fetch_one(STATUSES, &context_filter(context)).await
    }

    // Token metadata

    /// Full-document replace keyed by token id, creating it if absent
    pub async fn upsert_token(&self, token: &TokenRecord) -> Result<()> {
        let tokens = self.collection(TOKENS).await?;
        tokens
            .replace_one(&token_filter(token.token_id()), serde_json::to_value(token)?, true)
            .await?;
        debug!(token_id = token.token_id(), "Replaced token record");
        Ok(())
    }

    pub async fn delete_token(&self, token_id: &str) -> Result<u64> {
        let tokens = self.collection(TOKENS).await?;
        Ok(tokens.delete_many(&token_filter(token_id)).await?)
    }

    pub async fn fetch_token(&self, token_id: &str) -> Result<Option<TokenRecord>> {
        self.fetch_one(TOKENS, &token_filter(token_id)).await
    }

    pub async fn fetch_all_tokens(&self) -> Result<Vec<TokenRecord>> {
        self.fetch_many(TOKENS, &Filter::All).await
    }

    pub async fn reset_tokens(&self) -> Result<()> {
        self.reset(TOKENS).await
    }

    // Token graphs

    /// Persist a freshly computed graph
    ///
    /// 1. Replace-upsert every node by (token id, txid).
    /// 2. Replace the token record.
    /// 3. Remove every purged txid from graphs, confirmed and unconfirmed.
    ///
    /// The steps are not atomic as a unit. Each is idempotent, so a failed
    /// call is re-driven from the start.
    pub async fn apply_graph_delta(&self, delta: &GraphDelta) -> Result<GraphDeltaStats> {
        let started = Instant::now();
        let graphs = self.collection(GRAPHS).await?;
        let mut stats = GraphDeltaStats::default();

        for record in &delta.upserts {
            let (token_id, txid) = (record.token_id(), record.txid());
            let outcome = graphs
                .replace_one(
                    &graph_node_filter(token_id, txid),
                    serde_json::to_value(record)?,
                    true,
                )
                .await?;

            if outcome.modified > 0 {
                debug!(txid, token_id, "Graph node modified");
                stats.modified += 1;
            } else if outcome.upserted.is_some() {
                debug!(txid, token_id, "Graph node inserted");
                stats.inserted += 1;
            } else if outcome.matched > 0 {
                stats.unchanged += 1;
            } else {
                return Err(LedgerError::GraphUpsertRejected {
                    txid: txid.to_string(),
                    token_id: token_id.to_string(),
                });
            }
        }

        self.upsert_token(&delta.token).await?;

        for txid in &delta.purge {
            stats.purged += self.purge_transaction(txid).await?;
        }

        info!(
            token_id = delta.token.token_id(),
            inserted = stats.inserted,
            modified = stats.modified,
            unchanged = stats.unchanged,
            purged = stats.purged,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Applied graph delta"
        );
        Ok(stats)
    }

    /// Remove a txid from every pool
    async fn purge_transaction(&self, txid: &str) -> Result<u64> {
        let graphs = self.collection(GRAPHS).await?;
        let confirmed = self.collection(CONFIRMED).await?;
        let unconfirmed = self.collection(UNCONFIRMED).await?;

        let removed = graphs.delete_many(&graph_txid_filter(txid)).await?
            + confirmed.delete_many(&txid_filter(txid)).await?
            + unconfirmed.delete_many(&txid_filter(txid)).await?;
        debug!(txid, removed, "Purged transaction");
        Ok(removed)
    }

    pub async fn delete_graph(&self, token_id: &str) -> Result<u64> {
        let graphs = self.collection(GRAPHS).await?;
        Ok(graphs.delete_many(&token_filter(token_id)).await?)
    }

    /// Graph nodes of a token that survive pruning at `floor`; every node when
    /// no floor is given
    pub async fn fetch_graph(&self, token_id: &str, floor: Option<u64>) -> Result<Vec<GraphRecord>> {
        self.fetch_many(GRAPHS, &retained_graph_filter(token_id, floor))
            .await
    }

    pub async fn fetch_graph_txn(&self, txid: &str) -> Result<Option<GraphRecord>> {
        self.fetch_one(GRAPHS, &graph_txid_filter(txid)).await
    }

    pub async fn reset_graph(&self) -> Result<()> {
        self.reset(GRAPHS).await
    }

    // Unconfirmed pool

    pub async fn insert_unconfirmed(&self, txn: &TxnRecord) -> Result<()> {
        let unconfirmed = self.collection(UNCONFIRMED).await?;
        unconfirmed.insert_one(serde_json::to_value(txn)?).await?;
        Ok(())
    }

    pub async fn delete_unconfirmed(&self, txid: &str) -> Result<u64> {
        let unconfirmed = self.collection(UNCONFIRMED).await?;
        Ok(unconfirmed.delete_many(&txid_filter(txid)).await?)
    }

    pub async fn fetch_unconfirmed(&self, txid: &str) -> Result<Option<TxnRecord>> {
        self.fetch_one(UNCONFIRMED, &txid_filter(txid)).await
    }

    /// Mempool transactions carrying a token annotation
    pub async fn fetch_unconfirmed_annotated(&self) -> Result<Vec<TxnRecord>> {
        self.fetch_many(UNCONFIRMED, &Filter::exists(ANNOTATION_FIELD))
            .await
    }

    pub async fn reset_unconfirmed(&self) -> Result<()> {
        self.reset(UNCONFIRMED).await
    }

    // Confirmed pool

    pub async fn fetch_confirmed(&self, txid: &str) -> Result<Option<TxnRecord>> {
        self.fetch_one(CONFIRMED, &txid_filter(txid)).await
    }

    pub async fn delete_confirmed(&self, txid: &str) -> Result<u64> {
        let confirmed = self.collection(CONFIRMED).await?;
        Ok(confirmed.delete_many(&txid_filter(txid)).await?)
    }

    pub async fn reset_confirmed(&self) -> Result<()> {
        self.reset(CONFIRMED).await
    }

    /// Replace everything recorded at `block_index` with `items`
    ///
    /// A reorg can change which transactions occupy a height, so the old
    /// contents are deleted before the batch is upserted by txid.
    pub async fn replace_confirmed_block(&self, items: &[TxnRecord], block_index: u64) -> Result<()> {
        if let Some(item) = items.iter().find(|item| item.blk.is_none()) {
            return Err(LedgerError::MissingBlockRef {
                txid: item.txid().to_string(),
            });
        }

        let confirmed = self.collection(CONFIRMED).await?;

        info!(block_index, "Deleting confirmed transactions in block (for replacement)");
        let deleted = confirmed
            .delete_many(&block_filter(block_index))
            .await
            .inspect_err(|err| error!(block_index, %err, "Confirmed block delete failed"))?;

        info!(block_index, deleted, items = items.len(), "Updating block");
        for item in items {
            confirmed
                .replace_one(&txid_filter(item.txid()), serde_json::to_value(item)?, true)
                .await?;
        }
        Ok(())
    }

    /// Insert confirmed transactions in chunks, skipping ones already stored
    ///
    /// Duplicate keys are expected and ignored. Any other failure aborts the
    /// remaining chunks. Duplicates are only detected once the unique `tx.h`
    /// index exists (see [`LedgerStore::ensure_indexes`]).
    pub async fn bulk_insert_confirmed(&self, items: &[TxnRecord]) -> Result<BulkInsertStats> {
        let confirmed = self.collection(CONFIRMED).await?;
        let mut stats = BulkInsertStats::default();

        for chunk in items.chunks(CONFIRMED_INSERT_CHUNK) {
            let docs = chunk
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            match confirmed.insert_many(docs, false).await {
                Ok(inserted) => stats.inserted += inserted,
                Err(CollectionError::BulkWrite {
                    inserted, failures, ..
                }) if failures.iter().all(|f| f.is_duplicate_key()) => {
                    debug!(inserted, duplicates = failures.len(), "Skipped duplicate confirmed transactions");
                    stats.inserted += inserted;
                    stats.duplicates += failures.len();
                }
                Err(err) => {
                    error!(%err, chunk_len = chunk.len(), "Confirmed insert failed");
                    return Err(err.into());
                }
            }
        }
        Ok(stats)
    }

    // Index maintenance

    /// Create the configured indexes
    ///
    /// One index per key field, unique for the txid field, plus a `fulltext`
    /// index over the text fields of each collection. Any failure is fatal.
    pub async fn ensure_indexes(&self, config: &BTreeMap<String, IndexConfig>) -> Result<()> {
        info!("Indexing collections");
        let started = Instant::now();

        for (name, index) in config {
            let collection = self.collection(name).await?;

            for key in &index.keys {
                let spec = if key == TXID_FIELD {
                    IndexSpec::ascending(key).unique()
                } else {
                    IndexSpec::ascending(key)
                };
                let key_started = Instant::now();
                create_index(collection.as_ref(), spec, key).await?;
                debug!(
                    collection = %name,
                    key = %key,
                    elapsed_ms = key_started.elapsed().as_millis() as u64,
                    "Indexed key"
                );
            }

            if !index.fulltext.is_empty() {
                let fields = index.fulltext.join(",");
                create_index(collection.as_ref(), IndexSpec::text(index.fulltext.clone()), &fields)
                    .await?;
                debug!(collection = %name, fields = %fields, "Created full text index");
            }
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Indexing finished");

        for name in [CONFIRMED, UNCONFIRMED] {
            let indexes = self.collection(name).await?.list_indexes().await?;
            let names: Vec<&str> = indexes.iter().map(|spec| spec.name.as_str()).collect();
            info!(collection = name, indexes = ?names, "Index catalog");
        }
        Ok(())
    }

    // Helpers

    async fn fetch_one<T: DeserializeOwned>(&self, name: &str, filter: &Filter) -> Result<Option<T>> {
        let collection = self.collection(name).await?;
        match collection.find_one(filter).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn fetch_many<T: DeserializeOwned>(&self, name: &str, filter: &Filter) -> Result<Vec<T>> {
        let collection = self.collection(name).await?;
        let docs = collection.find(filter, None).await?;
        Ok(docs
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()?)
    }

    async fn reset(&self, name: &str) -> Result<()> {
        let collection = self.collection(name).await?;
        let removed = collection
            .delete_many(&Filter::All)
            .await
            .inspect_err(|err| error!(collection = name, %err, "Collection reset failed"))?;
        info!(collection = name, removed, "Collection reset");
        Ok(())
    }
}

async fn create_index(collection: &dyn Collection, spec: IndexSpec, field: &str) -> Result<()> {
    collection.create_index(spec).await.map_err(|source| {
        error!(collection = collection.name(), field, %source, "Index creation failed");
        LedgerError::Index {
            collection: collection.name().to_string(),
            field: field.to_string(),
            source,
        }
    })
}

