//! Graph retention policy
//!
//! A graph node is kept unless it is provably below the caller's retention
//! floor: its prune height must exceed the floor, or be unset, or the node must
//! be the token's genesis (the DAG root, whose txid is the token id).
use crate::docstore::Filter;

use super::collections::{GRAPH_TXID_FIELD, PRUNE_HEIGHT_FIELD, token_filter};

/// Filter selecting the retained graph nodes of a token
pub fn retained_graph_filter(token_id: &str, floor: Option<u64>) -> Filter {
    match floor {
        None => token_filter(token_id),
        Some(floor) => Filter::And(vec![
            token_filter(token_id),
            Filter::Or(vec![
                Filter::gt(PRUNE_HEIGHT_FIELD, floor),
                Filter::is_null(PRUNE_HEIGHT_FIELD),
                Filter::eq(GRAPH_TXID_FIELD, token_id),
            ]),
        ]),
    }
}
