//! Key layout and encoding utilities for the document store
//!
//! Partition structure:
//! - `<collection>`: {doc_id:u64 BE} -> document (JSON)
//! - `<collection>__idx`: {index}\0{value JSON}\0{doc_id:u64 BE} -> empty
//! - `_catalog`: col:{collection} -> empty
//! - `_catalog`: seq:{collection} -> next doc_id (u64 BE)
//! - `_catalog`: idx:{collection}:{index} -> IndexSpec (JSON)
//!
//! serde_json escapes control characters, so a NUL never appears inside an
//! encoded value and the separators are unambiguous.
use serde_json::Value;

pub const CATALOG_PARTITION: &str = "_catalog";

const SEPARATOR: u8 = 0;

const INDEX_PARTITION_SUFFIX: &str = "__idx";

/// Collection names double as fjall partition names. They must start with an
/// alphanumeric character and must not clash with an index partition.
pub fn is_valid_collection_name(name: &str) -> bool {
    name.len() <= 200
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && !name.ends_with(INDEX_PARTITION_SUFFIX)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn index_partition_name(collection: &str) -> String {
    format!("{collection}{INDEX_PARTITION_SUFFIX}")
}

pub fn encode_doc_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

pub fn decode_doc_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Prefix shared by every entry of `index` holding `value`
pub fn encode_index_prefix(index: &str, value: &Value) -> Vec<u8> {
    let mut key = Vec::with_capacity(index.len() + 16);
    key.extend_from_slice(index.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(value.to_string().as_bytes());
    key.push(SEPARATOR);
    key
}

pub fn encode_index_key(index: &str, value: &Value, id: u64) -> Vec<u8> {
    let mut key = encode_index_prefix(index, value);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// The document id is the trailing 8 bytes of an index entry
pub fn decode_index_doc_id(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    decode_doc_key(&key[start..])
}

pub fn encode_collection_key(collection: &str) -> Vec<u8> {
    format!("col:{collection}").into_bytes()
}

pub fn decode_collection_key(key: &[u8]) -> Option<String> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("col:").map(String::from)
}

pub fn encode_collection_prefix() -> &'static [u8] {
    b"col:"
}

pub fn encode_seq_key(collection: &str) -> Vec<u8> {
    format!("seq:{collection}").into_bytes()
}

pub fn encode_index_def_key(collection: &str, index: &str) -> Vec<u8> {
    format!("idx:{collection}:{index}").into_bytes()
}

pub fn encode_index_def_prefix(collection: &str) -> Vec<u8> {
    format!("idx:{collection}:").into_bytes()
}
