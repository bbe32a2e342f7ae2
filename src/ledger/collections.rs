//! Collection names, field paths and key filters
//!
//! Layout:
//! - `confirmed`: transactions bound to a block, keyed by `tx.h`, grouped by `blk.i`
//! - `unconfirmed`: mempool transactions, keyed by `tx.h`
//! - `graphs`: DAG nodes, keyed by (`tokenDetails.tokenIdHex`, `graphTxn.txid`)
//! - `tokens`: token metadata, keyed by `tokenDetails.tokenIdHex`
//! - `statuses`: checkpoints, keyed by `context`
use crate::docstore::Filter;

pub const CONFIRMED: &str = "confirmed";
pub const UNCONFIRMED: &str = "unconfirmed";
pub const GRAPHS: &str = "graphs";
pub const TOKENS: &str = "tokens";
pub const STATUSES: &str = "statuses";

pub const TXID_FIELD: &str = "tx.h";
pub const BLOCK_INDEX_FIELD: &str = "blk.i";
pub const ANNOTATION_FIELD: &str = "slp";
pub const TOKEN_ID_FIELD: &str = "tokenDetails.tokenIdHex";
pub const GRAPH_TXID_FIELD: &str = "graphTxn.txid";
pub const PRUNE_HEIGHT_FIELD: &str = "graphTxn.pruneHeight";
pub const CONTEXT_FIELD: &str = "context";

/// Transaction by txid, in either pool
pub fn txid_filter(txid: &str) -> Filter {
    Filter::eq(TXID_FIELD, txid)
}

pub fn block_filter(block_index: u64) -> Filter {
    Filter::eq(BLOCK_INDEX_FIELD, block_index)
}

/// Token document, or every graph node of a token
pub fn token_filter(token_id: &str) -> Filter {
    Filter::eq(TOKEN_ID_FIELD, token_id)
}

/// Graph node by txid, across all tokens
pub fn graph_txid_filter(txid: &str) -> Filter {
    Filter::eq(GRAPH_TXID_FIELD, txid)
}

pub fn graph_node_filter(token_id: &str, txid: &str) -> Filter {
    Filter::And(vec![token_filter(token_id), graph_txid_filter(txid)])
}

pub fn context_filter(context: &str) -> Filter {
    Filter::eq(CONTEXT_FIELD, context)
}
