//! External read engine boundary
//!
//! The engine executes a [`QueryDescriptor`] and answers with two partitions of
//! flat records: `c` for confirmed and `u` for unconfirmed transactions.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::descriptor::QueryDescriptor;
use super::error::{QueryError, Result};

/// One projected result row, keyed by projection name
pub type FlatRecord = Map<String, Value>;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine rejected query: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    #[serde(rename = "c", default)]
    pub confirmed: Vec<FlatRecord>,
    #[serde(rename = "u", default)]
    pub unconfirmed: Vec<FlatRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl EngineResponse {
    pub fn new(confirmed: Vec<FlatRecord>, unconfirmed: Vec<FlatRecord>) -> Self {
        Self {
            confirmed,
            unconfirmed,
            errors: None,
        }
    }

    /// Confirmed then unconfirmed records, deduplicated on `identity`
    pub fn into_merged(self, identity: &str) -> Result<Vec<FlatRecord>> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            return Err(QueryError::QueryFailed(errors));
        }
        Ok(merge_unique(
            self.confirmed.into_iter().chain(self.unconfirmed),
            identity,
        ))
    }
}

/// Keep the first record seen for each value of `identity`
///
/// A transaction can sit in both partitions while it confirms. Records without
/// the identity field have nothing to collide on and are all kept.
pub fn merge_unique<I>(records: I, identity: &str) -> Vec<FlatRecord>
where
    I: IntoIterator<Item = FlatRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.get(identity) {
            Some(Value::Null) | None => true,
            Some(key) => seen.insert(key.to_string()),
        })
        .collect()
}

#[async_trait]
pub trait ReadEngine: Send + Sync {
    async fn read(&self, query: &QueryDescriptor) -> std::result::Result<EngineResponse, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FlatRecord {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let response = EngineResponse::new(
            vec![record(json!({ "txid": "a", "block": 10 }))],
            vec![
                record(json!({ "txid": "a", "block": null })),
                record(json!({ "txid": "b", "block": null })),
            ],
        );
        let merged = response.into_merged("txid").unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0]["block"], json!(10));
        assert_eq!(merged[1]["txid"], json!("b"));
    }

    #[test]
    fn test_records_without_identity_are_kept() {
        let merged = merge_unique(
            vec![record(json!({ "x": 1 })), record(json!({ "x": 1 }))],
            "txid",
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_reported_errors_fail_the_query() {
        let response = EngineResponse {
            errors: Some(vec!["timeout".to_string()]),
            ..EngineResponse::default()
        };
        assert!(matches!(
            response.into_merged("txid"),
            Err(QueryError::QueryFailed(errors)) if errors == vec!["timeout".to_string()]
        ));

        let empty_errors = EngineResponse {
            errors: Some(Vec::new()),
            ..EngineResponse::default()
        };
        assert!(empty_errors.into_merged("txid").unwrap().is_empty());
    }

    #[test]
    fn test_response_wire_shape() {
        let response: EngineResponse =
            serde_json::from_value(json!({ "c": [ { "txid": "a" } ], "u": [] })).unwrap();
        assert_eq!(response.confirmed.len(), 1);
        assert!(response.errors.is_none());
    }
}
