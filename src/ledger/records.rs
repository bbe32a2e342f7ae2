//! Persisted record shapes
//!
//! Field names follow the document layout read by the rest of the indexer
//! (`tx.h`, `blk.i`, `tokenDetails.tokenIdHex`, `graphTxn.txid`), so the
//! structs rename to camelCase and keep the short envelope keys as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::quantity::TokenQuantity;

/// Token metadata fixed at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub token_id_hex: String,
    pub version_type: u8,
    pub symbol: String,
    pub name: String,
    pub document_uri: String,
    #[serde(default)]
    pub document_sha256_hex: Option<String>,
    pub decimals: u32,
    /// Mint baton output, absent when minting has ended
    #[serde(default)]
    pub baton_vout: Option<u32>,
    pub genesis_or_mint_quantity: TokenQuantity,
}

/// One document per token, replaced wholesale by the graph builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub schema_version: u32,
    pub token_details: TokenDetails,
    /// Builder-owned state (stats, baton location, ...), stored opaquely
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl TokenRecord {
    pub fn new(token_details: TokenDetails) -> Self {
        Self {
            schema_version: 1,
            token_details,
            state: Map::new(),
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_details.token_id_hex
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphTokenRef {
    pub token_id_hex: String,
}

/// A transaction's place in a token's DAG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub txid: String,
    /// Height below which this node may be discarded; null until prunable
    #[serde(default)]
    pub prune_height: Option<u64>,
    /// Builder-owned node details (inputs, outputs, validity), stored opaquely
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Graph document, unique by (token id, txid)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    pub token_details: GraphTokenRef,
    pub graph_txn: GraphNode,
}

impl GraphRecord {
    pub fn new(token_id: impl Into<String>, txid: impl Into<String>, prune_height: Option<u64>) -> Self {
        Self {
            token_details: GraphTokenRef {
                token_id_hex: token_id.into(),
            },
            graph_txn: GraphNode {
                txid: txid.into(),
                prune_height,
                details: Map::new(),
            },
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_details.token_id_hex
    }

    pub fn txid(&self) -> &str {
        &self.graph_txn.txid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRef {
    pub h: String,
}

/// Block a confirmed transaction belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    /// Height
    pub i: u64,
    /// Hash
    pub h: String,
    /// Unix timestamp
    pub t: i64,
}

/// Transaction envelope, stored in either the confirmed or the unconfirmed pool
///
/// Nothing here keeps a txid out of both pools at once; callers delete from
/// one pool when moving a transaction into the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxnRecord {
    pub tx: TxRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blk: Option<BlockRef>,
    /// Token protocol annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slp: Option<Value>,
    /// Raw envelope (`in`, `out`, ...)
    #[serde(flatten)]
    pub envelope: Map<String, Value>,
}

pub type ConfirmedTxn = TxnRecord;
pub type UnconfirmedTxn = TxnRecord;

impl TxnRecord {
    pub fn unconfirmed(txid: impl Into<String>) -> Self {
        Self {
            tx: TxRef { h: txid.into() },
            blk: None,
            slp: None,
            envelope: Map::new(),
        }
    }

    pub fn confirmed(txid: impl Into<String>, blk: BlockRef) -> Self {
        Self {
            blk: Some(blk),
            ..Self::unconfirmed(txid)
        }
    }

    pub fn with_annotation(mut self, slp: Value) -> Self {
        self.slp = Some(slp);
        self
    }

    pub fn txid(&self) -> &str {
        &self.tx.h
    }
}

/// Crash-recovery checkpoint, one per context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub context: String,
    pub saved_at: DateTime<Utc>,
    pub state: Value,
}

/// Writes derived from a freshly computed token graph
#[derive(Debug, Clone)]
pub struct GraphDelta {
    pub upserts: Vec<GraphRecord>,
    pub token: TokenRecord,
    /// Txids no longer part of any token's history
    pub purge: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graph_record_layout() {
        let mut record = GraphRecord::new("tok", "tx1", None);
        record.graph_txn.details.insert("outputs".into(), json!([]));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "tokenDetails": { "tokenIdHex": "tok" },
                "graphTxn": { "txid": "tx1", "pruneHeight": null, "outputs": [] }
            })
        );
        let back: GraphRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_txn_record_keeps_envelope() {
        let raw = json!({
            "tx": { "h": "aa" },
            "blk": { "i": 5, "h": "bb", "t": 1 },
            "in": [],
            "out": [ { "h1": "534c5000" } ]
        });
        let record: TxnRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.txid(), "aa");
        assert_eq!(record.blk.as_ref().map(|b| b.i), Some(5));
        assert!(record.slp.is_none());
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_token_quantity_persists_as_string() {
        let details = TokenDetails {
            token_id_hex: "tok".into(),
            version_type: 1,
            symbol: "TT".into(),
            name: "Test".into(),
            document_uri: String::new(),
            document_sha256_hex: None,
            decimals: 8,
            baton_vout: Some(2),
            genesis_or_mint_quantity: TokenQuantity(u64::MAX),
        };
        let value = serde_json::to_value(TokenRecord::new(details)).unwrap();
        assert_eq!(
            value["tokenDetails"]["genesisOrMintQuantity"],
            json!("18446744073709551615")
        );
    }
}
