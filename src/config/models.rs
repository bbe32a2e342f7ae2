use crate::humanize::ByteSize;
use crate::ledger::collections::{CONFIRMED, GRAPHS, TOKENS, UNCONFIRMED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Secondary indexes per collection
    #[serde(default = "default_indexes")]
    pub index: BTreeMap<String, IndexConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
            index: default_indexes(),
        }
    }
}

/// Embedded document store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Block cache shared by all collections
    #[serde(default = "default_cache_size")]
    pub cache_size: ByteSize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/tokenledger")
}

fn default_cache_size() -> ByteSize {
    ByteSize::mib(64)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Index definitions for one collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Dotted field paths, one ascending index each
    #[serde(default)]
    pub keys: Vec<String>,
    /// Fields covered by the collection's text index
    #[serde(default)]
    pub fulltext: Vec<String>,
}

impl IndexConfig {
    fn with_keys(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            fulltext: Vec::new(),
        }
    }
}

pub(crate) fn default_indexes() -> BTreeMap<String, IndexConfig> {
    let txn_keys = ["tx.h", "blk.i", "out.h1", "out.h4", "in.e.h"];
    let mut tokens = IndexConfig::with_keys(&["tokenDetails.tokenIdHex"]);
    tokens.fulltext = vec!["tokenDetails.name".into(), "tokenDetails.symbol".into()];

    BTreeMap::from([
        (CONFIRMED.to_string(), IndexConfig::with_keys(&txn_keys)),
        (UNCONFIRMED.to_string(), IndexConfig::with_keys(&txn_keys)),
        (
            GRAPHS.to_string(),
            IndexConfig::with_keys(&["graphTxn.txid", "tokenDetails.tokenIdHex"]),
        ),
        (TOKENS.to_string(), tokens),
    ])
}
