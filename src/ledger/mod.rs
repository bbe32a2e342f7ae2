//! Token ledger persistence
//!
//! This module stores what the graph builder and block processor hand it:
//!
//! - Confirmed transactions, grouped by block height for reorg replacement
//! - Unconfirmed (mempool) transactions
//! - Per-token DAG nodes with prune heights
//! - Per-token metadata
//! - Crash-recovery checkpoints
//!
//! It does not validate token rules. A txid is expected in at most one of the
//! confirmed/unconfirmed pools; callers move transactions between pools
//! themselves.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokenledger::ledger::LedgerStore;
//! use tokenledger::docstore::FjallConnector;
//!
//! let store = LedgerStore::new(FjallConnector::new("data/tokenledger"));
//! store.ensure_indexes(&config.index).await?;
//! let graph = store.fetch_graph(&token_id, Some(last_pruned_height)).await?;
//! ```

pub mod collections;
pub mod error;
pub mod pruning;
pub mod records;
pub mod store;

pub use error::{LedgerError, Result};
pub use records::{
    BlockRef, ConfirmedTxn, GraphDelta, GraphNode, GraphRecord, GraphTokenRef, StatusRecord,
    TokenDetails, TokenRecord, TxRef, TxnRecord, UnconfirmedTxn,
};
pub use store::{BulkInsertStats, CONFIRMED_INSERT_CHUNK, GraphDeltaStats, LedgerStore};
