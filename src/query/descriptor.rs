//! Declarative query descriptors for the read engine
//!
//! A descriptor pairs a [`Filter`] over transaction documents with a list of
//! projections that flatten each match into a [`FlatRecord`](super::FlatRecord).
//! Output chunks are addressed the way the engine indexes script pushes:
//! `out[n].h{chunk}` for hex, `out[n].s{chunk}` for UTF-8, `out[n].e.v` for the
//! output value.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::docstore::Filter;

pub const QUERY_VERSION: u8 = 3;

/// Token protocol marker pushed as the first chunk after OP_RETURN
pub const LOKAD_ID_HEX: &str = "534c5000";
pub const GENESIS: &str = "GENESIS";
pub const MINT: &str = "MINT";

/// Token outputs a SEND can carry (outputs 1 through 19)
pub const MAX_SEND_OUTPUTS: usize = 19;

/// Upper bound on rows returned by the token listing
pub const TOKEN_LIST_LIMIT: usize = 10_000;

/// Projection names shared by descriptor construction and decoding
pub mod fields {
    pub const TXID: &str = "txid";
    pub const BLOCK: &str = "block";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TOKEN_ID: &str = "tokenid";
    pub const TOKEN_ID_HEX: &str = "tokenIdHex";
    pub const VERSION_TYPE_HEX: &str = "versionTypeHex";
    pub const SYMBOL: &str = "symbol";
    pub const NAME: &str = "name";
    pub const DOCUMENT_URI: &str = "documentUri";
    pub const DOCUMENT_SHA256_HEX: &str = "documentSha256Hex";
    pub const DECIMALS_HEX: &str = "decimalsHex";
    pub const BATON_HEX: &str = "batonHex";
    pub const QUANTITY_HEX: &str = "quantityHex";
}

/// Where a projected field comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    TxHash,
    /// Block height, null when unconfirmed
    BlockIndex,
    /// Block time as `%Y-%m-%d %H:%M` UTC, null when unconfirmed
    BlockTime,
    OutputHex { out: usize, chunk: usize },
    OutputStr { out: usize, chunk: usize },
    OutputValue { out: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
    pub source: Source,
}

impl Projection {
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub v: u8,
    pub find: Filter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    pub project: Vec<Projection>,
}

/// Render a block timestamp the way [`Source::BlockTime`] expects
pub fn format_block_time(unix_secs: i64) -> Option<String> {
    DateTime::from_timestamp(unix_secs, 0).map(|t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn out_hex(chunk: usize) -> Source {
    Source::OutputHex { out: 0, chunk }
}

fn out_str(chunk: usize) -> Source {
    Source::OutputStr { out: 0, chunk }
}

fn token_marker() -> Filter {
    Filter::eq("out.h1", LOKAD_ID_HEX)
}

/// Confirmed at or after `block`, or not yet confirmed
fn since_block(block: u64) -> Filter {
    Filter::Or(vec![Filter::gte("blk.i", block), Filter::is_null("blk.i")])
}

/// Txids of a token's transactions since `block`
pub fn recent_token_txns(token_id: &str, block: u64) -> QueryDescriptor {
    QueryDescriptor {
        v: QUERY_VERSION,
        find: Filter::And(vec![
            token_marker(),
            Filter::eq("out.h4", token_id),
            since_block(block),
        ]),
        limit: None,
        project: vec![Projection::new(fields::TXID, Source::TxHash)],
    }
}

/// Which genesis transactions to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisKey {
    TokenId(String),
    /// Every genesis, optionally only those since a block
    Since(Option<u64>),
}

pub fn genesis_lookup(key: &GenesisKey) -> QueryDescriptor {
    let mut find = vec![token_marker(), Filter::eq("out.s3", GENESIS)];
    let limit = match key {
        GenesisKey::TokenId(token_id) => {
            find.insert(0, Filter::eq("tx.h", token_id.as_str()));
            None
        }
        GenesisKey::Since(block) => {
            if let Some(block) = block {
                find.push(since_block(*block));
            }
            Some(TOKEN_LIST_LIMIT)
        }
    };

    QueryDescriptor {
        v: QUERY_VERSION,
        find: Filter::And(find),
        limit,
        project: vec![
            Projection::new(fields::TOKEN_ID_HEX, Source::TxHash),
            Projection::new(fields::VERSION_TYPE_HEX, out_hex(2)),
            Projection::new(fields::TIMESTAMP, Source::BlockTime),
            Projection::new(fields::SYMBOL, out_str(4)),
            Projection::new(fields::NAME, out_str(5)),
            Projection::new(fields::DOCUMENT_URI, out_str(6)),
            Projection::new(fields::DOCUMENT_SHA256_HEX, out_hex(7)),
            Projection::new(fields::DECIMALS_HEX, out_hex(8)),
            Projection::new(fields::BATON_HEX, out_hex(9)),
            Projection::new(fields::QUANTITY_HEX, out_hex(10)),
        ],
    }
}

pub fn mint_lookup(token_id: &str) -> QueryDescriptor {
    QueryDescriptor {
        v: QUERY_VERSION,
        find: Filter::And(vec![
            token_marker(),
            Filter::eq("out.s3", MINT),
            Filter::eq("out.h4", token_id),
        ]),
        limit: None,
        project: vec![
            Projection::new(fields::TXID, Source::TxHash),
            Projection::new(fields::VERSION_TYPE_HEX, out_hex(2)),
            Projection::new(fields::BLOCK, Source::BlockIndex),
            Projection::new(fields::TIMESTAMP, Source::BlockTime),
            Projection::new(fields::BATON_HEX, out_hex(5)),
            Projection::new(fields::QUANTITY_HEX, out_hex(6)),
        ],
    }
}

pub fn confirmation_lookup(txid: &str) -> QueryDescriptor {
    QueryDescriptor {
        v: QUERY_VERSION,
        find: Filter::eq("tx.h", txid),
        limit: None,
        project: vec![
            Projection::new(fields::TXID, Source::TxHash),
            Projection::new(fields::BLOCK, Source::BlockIndex),
            Projection::new(fields::TIMESTAMP, Source::BlockTime),
        ],
    }
}

/// Projected columns of one spender output, in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Token quantity column; output 0 carries no tokens
    pub quantity: Option<String>,
    /// Output value column (satoshis)
    pub value: String,
}

/// Spender lookup for one outpoint, with its output columns
#[derive(Debug, Clone, PartialEq)]
pub struct SpendQuery {
    pub descriptor: QueryDescriptor,
    pub outputs: Vec<OutputColumn>,
}

impl SpendQuery {
    pub fn new(txid: &str, vout: u32) -> Self {
        let mut project = vec![
            Projection::new(fields::TXID, Source::TxHash),
            Projection::new(fields::BLOCK, Source::BlockIndex),
            Projection::new(fields::TIMESTAMP, Source::BlockTime),
            Projection::new(fields::TOKEN_ID, out_hex(4)),
        ];
        let mut outputs = Vec::with_capacity(MAX_SEND_OUTPUTS + 1);

        for out in 0..=MAX_SEND_OUTPUTS {
            let value = format!("bch{out}");
            project.push(Projection::new(value.clone(), Source::OutputValue { out }));

            // SEND amounts start at chunk 5, one per token output
            let quantity = (out > 0).then(|| {
                let name = format!("slp{out}");
                project.push(Projection::new(name.clone(), out_hex(4 + out)));
                name
            });
            outputs.push(OutputColumn { quantity, value });
        }

        let descriptor = QueryDescriptor {
            v: QUERY_VERSION,
            find: Filter::ElemMatch(
                "in".to_string(),
                vec![Filter::eq("e.h", txid), Filter::eq("e.i", vout)],
            ),
            limit: None,
            project,
        };
        Self {
            descriptor,
            outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_time_format() {
        assert_eq!(format_block_time(0).as_deref(), Some("1970-01-01 00:00"));
        assert_eq!(
            format_block_time(1_554_076_800).as_deref(),
            Some("2019-04-01 00:00")
        );
    }

    #[test]
    fn test_spend_query_columns_are_positional() {
        let query = SpendQuery::new("aa", 1);
        assert_eq!(query.outputs.len(), MAX_SEND_OUTPUTS + 1);
        assert_eq!(query.outputs[0].quantity, None);
        assert_eq!(query.outputs[0].value, "bch0");
        assert_eq!(query.outputs[3].quantity.as_deref(), Some("slp3"));
        assert_eq!(query.outputs[3].value, "bch3");

        let slp3 = query
            .descriptor
            .project
            .iter()
            .find(|p| p.name == "slp3")
            .unwrap();
        assert_eq!(slp3.source, Source::OutputHex { out: 0, chunk: 7 });
    }

    #[test]
    fn test_spend_query_matches_single_input() {
        let query = SpendQuery::new("aa", 1);
        let spender = json!({ "in": [ { "e": { "h": "aa", "i": 1 } } ] });
        let other = json!({ "in": [ { "e": { "h": "aa", "i": 2 } } ] });
        assert!(query.descriptor.find.matches(&spender));
        assert!(!query.descriptor.find.matches(&other));
    }

    #[test]
    fn test_recent_txns_includes_unconfirmed() {
        let query = recent_token_txns("tok", 100);
        let base = json!({ "out": [ { "h1": LOKAD_ID_HEX, "h4": "tok" } ] });
        let mut old = base.clone();
        old["blk"] = json!({ "i": 99 });
        let mut new = base.clone();
        new["blk"] = json!({ "i": 100 });

        assert!(query.find.matches(&base));
        assert!(query.find.matches(&new));
        assert!(!query.find.matches(&old));
    }

    #[test]
    fn test_genesis_lookup_variants() {
        let by_id = genesis_lookup(&GenesisKey::TokenId("tok".into()));
        assert_eq!(by_id.limit, None);
        let doc = json!({ "tx": { "h": "tok" }, "out": [ { "h1": LOKAD_ID_HEX, "s3": GENESIS } ] });
        assert!(by_id.find.matches(&doc));

        let listing = genesis_lookup(&GenesisKey::Since(None));
        assert_eq!(listing.limit, Some(TOKEN_LIST_LIMIT));
        assert!(listing.find.matches(&doc));
    }

    #[test]
    fn test_descriptor_serializes() {
        let value = serde_json::to_value(confirmation_lookup("aa")).unwrap();
        assert_eq!(value["v"], json!(3));
        assert_eq!(value["find"], json!({ "eq": ["tx.h", "aa"] }));
        assert_eq!(value["project"][1], json!({ "name": "block", "source": { "kind": "block_index" } }));
        assert!(value.get("limit").is_none());
    }
}
