//! Flat record decoding
//!
//! All string-keyed access to engine records happens here. Empty pushes come
//! back from the engine as `""` or `null` and are read as absent.

use serde_json::Value;

use crate::quantity::TokenQuantity;

use super::descriptor::{fields, OutputColumn};
use super::engine::FlatRecord;
use super::error::{QueryError, Result};
use super::types::{
    is_valid_baton, Confirmation, GenesisDetails, MintEvent, SendOutput, SpendResolution,
};

/// Largest integer a hex push may carry
const MAX_UINT_BYTES: usize = 8;

fn text<'a>(record: &'a FlatRecord, field: &str) -> Option<&'a str> {
    match record.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn required_text<'a>(record: &'a FlatRecord, field: &str) -> Result<&'a str> {
    text(record, field).ok_or_else(|| QueryError::MissingField(field.to_string()))
}

fn owned_text(record: &FlatRecord, field: &str) -> Option<String> {
    text(record, field).map(str::to_string)
}

/// Unsigned integer from a number or a decimal string
fn uint(record: &FlatRecord, field: &str) -> Result<Option<u64>> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| QueryError::decode(field, format!("not an unsigned integer: {n}"))),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|err| QueryError::decode(field, err)),
        Some(other) => Err(QueryError::decode(field, format!("unexpected value {other}"))),
    }
}

/// Big-endian unsigned integer from a hex push
fn hex_uint(record: &FlatRecord, field: &str) -> Result<Option<u64>> {
    let Some(encoded) = text(record, field) else {
        return Ok(None);
    };
    let bytes = hex::decode(encoded).map_err(|err| QueryError::decode(field, err))?;
    if bytes.len() > MAX_UINT_BYTES {
        return Err(QueryError::decode(
            field,
            format!("{} bytes exceeds {MAX_UINT_BYTES}", bytes.len()),
        ));
    }
    Ok(Some(
        bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
    ))
}

/// Mint baton output index, if the push names a usable one
///
/// Leading zero bytes are ignored. A push that is not hex, or whose value
/// does not fit in 8 bytes, names no baton.
fn baton_vout(record: &FlatRecord) -> Option<u64> {
    let bytes = hex::decode(text(record, fields::BATON_HEX)?).ok()?;
    let significant = bytes
        .iter()
        .position(|byte| *byte != 0)
        .map_or(&[][..], |start| &bytes[start..]);
    if significant.len() > MAX_UINT_BYTES {
        return None;
    }
    let vout = significant
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    Some(vout).filter(|vout| is_valid_baton(*vout))
}

fn hex_quantity(record: &FlatRecord, field: &str) -> Result<Option<TokenQuantity>> {
    text(record, field)
        .map(TokenQuantity::from_hex)
        .transpose()
        .map_err(|err| QueryError::decode(field, err))
}

fn narrow<T: TryFrom<u64>>(field: &str, value: u64) -> Result<T> {
    T::try_from(value).map_err(|_| QueryError::decode(field, format!("{value} out of range")))
}

pub fn genesis(record: &FlatRecord) -> Result<GenesisDetails> {
    let version_type = hex_uint(record, fields::VERSION_TYPE_HEX)?
        .ok_or_else(|| QueryError::MissingField(fields::VERSION_TYPE_HEX.to_string()))?;
    let decimals = hex_uint(record, fields::DECIMALS_HEX)?.unwrap_or(0);
    let baton = baton_vout(record);
    let document_sha256 = text(record, fields::DOCUMENT_SHA256_HEX)
        .map(hex::decode)
        .transpose()
        .map_err(|err| QueryError::decode(fields::DOCUMENT_SHA256_HEX, err))?;

    Ok(GenesisDetails {
        token_id_hex: required_text(record, fields::TOKEN_ID_HEX)?.to_string(),
        version_type: narrow(fields::VERSION_TYPE_HEX, version_type)?,
        timestamp: owned_text(record, fields::TIMESTAMP),
        symbol: owned_text(record, fields::SYMBOL).unwrap_or_default(),
        name: owned_text(record, fields::NAME).unwrap_or_default(),
        document_uri: owned_text(record, fields::DOCUMENT_URI).unwrap_or_default(),
        document_sha256,
        decimals: narrow(fields::DECIMALS_HEX, decimals)?,
        baton_vout: baton.map(|vout| narrow(fields::BATON_HEX, vout)).transpose()?,
        contains_baton: baton.is_some(),
        genesis_quantity: hex_quantity(record, fields::QUANTITY_HEX)?
            .unwrap_or(TokenQuantity::ZERO),
    })
}

pub fn mint(record: &FlatRecord) -> Result<MintEvent> {
    Ok(MintEvent {
        txid: required_text(record, fields::TXID)?.to_string(),
        version_type_hex: owned_text(record, fields::VERSION_TYPE_HEX),
        block: uint(record, fields::BLOCK)?,
        timestamp: owned_text(record, fields::TIMESTAMP),
        baton_hex: owned_text(record, fields::BATON_HEX),
        quantity_hex: owned_text(record, fields::QUANTITY_HEX),
    })
}

/// Decode a single spender's outputs column by column
///
/// Output 0 must carry a value. Later outputs end at the first column the
/// spender does not have; outputs without a token amount carry zero tokens.
pub fn spend(record: &FlatRecord, columns: &[OutputColumn]) -> Result<SpendResolution> {
    let mut send_outputs = Vec::with_capacity(columns.len());
    for (out, column) in columns.iter().enumerate() {
        let Some(satoshis) = uint(record, &column.value)? else {
            if out == 0 {
                return Err(QueryError::MissingField(column.value.clone()));
            }
            break;
        };
        let token_qty = match &column.quantity {
            Some(field) => hex_quantity(record, field)?.unwrap_or(TokenQuantity::ZERO),
            None => TokenQuantity::ZERO,
        };
        send_outputs.push(SendOutput {
            token_qty,
            satoshis,
        });
    }

    Ok(SpendResolution {
        txid: Some(required_text(record, fields::TXID)?.to_string()),
        token_id: owned_text(record, fields::TOKEN_ID),
        block: uint(record, fields::BLOCK)?,
        timestamp: owned_text(record, fields::TIMESTAMP),
        send_outputs,
    })
}

/// `None` while the transaction is unconfirmed
pub fn confirmation(record: &FlatRecord) -> Result<Option<Confirmation>> {
    Ok(uint(record, fields::BLOCK)?.map(|block| Confirmation {
        block,
        timestamp: owned_text(record, fields::TIMESTAMP),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::descriptor::SpendQuery;
    use serde_json::json;

    fn record(value: Value) -> FlatRecord {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn genesis_record(baton: Value) -> FlatRecord {
        record(json!({
            "tokenIdHex": "tok",
            "versionTypeHex": "01",
            "timestamp": "2019-04-01 00:00",
            "symbol": "TT",
            "name": "Test Token",
            "documentUri": "",
            "documentSha256Hex": null,
            "decimalsHex": "08",
            "batonHex": baton,
            "quantityHex": "0000000100000000"
        }))
    }

    #[test]
    fn test_genesis_decodes_fields() {
        let details = genesis(&genesis_record(json!("02"))).unwrap();
        assert_eq!(details.token_id_hex, "tok");
        assert_eq!(details.version_type, 1);
        assert_eq!(details.decimals, 8);
        assert_eq!(details.baton_vout, Some(2));
        assert!(details.contains_baton);
        assert_eq!(details.document_uri, "");
        assert!(details.document_sha256.is_none());
        assert_eq!(details.genesis_quantity, TokenQuantity(1 << 32));
    }

    #[test]
    fn test_genesis_baton_boundaries() {
        for (baton, expected) in [
            (json!("00"), None),
            (json!("01"), None),
            (json!("02"), Some(2)),
            (json!("ff"), Some(255)),
            (json!("0100"), None),
            (json!("0101"), None),
            (json!(""), None),
            (Value::Null, None),
        ] {
            let details = genesis(&genesis_record(baton.clone())).unwrap();
            assert_eq!(details.baton_vout, expected, "baton {baton}");
            assert_eq!(details.contains_baton, expected.is_some());
        }
    }

    #[test]
    fn test_genesis_oversized_baton_means_no_baton() {
        for baton in [
            "000000000000000001".to_string(),
            "ff".repeat(16),
            "zz".to_string(),
        ] {
            let details = genesis(&genesis_record(json!(baton))).unwrap();
            assert_eq!(details.baton_vout, None, "baton {baton}");
            assert!(!details.contains_baton);
        }

        let padded = genesis(&genesis_record(json!("000000000000000002"))).unwrap();
        assert_eq!(padded.baton_vout, Some(2));
        assert!(padded.contains_baton);
    }

    #[test]
    fn test_genesis_rejects_bad_quantity() {
        let mut raw = genesis_record(Value::Null);
        raw.insert("quantityHex".into(), json!("0001"));
        assert!(matches!(
            genesis(&raw),
            Err(QueryError::Decode { field, .. }) if field == "quantityHex"
        ));
    }

    #[test]
    fn test_spend_decodes_positional_outputs() {
        let query = SpendQuery::new("aa", 1);
        let raw = record(json!({
            "txid": "bb",
            "block": 600000,
            "timestamp": "2019-10-01 12:00",
            "tokenid": "tok",
            "bch0": 0,
            "bch1": 546,
            "slp1": "0000000000000005",
            "bch2": "546",
            "slp2": "0000000000000003",
            "bch3": 10000,
            "slp3": null,
            "bch4": null
        }));
        let resolution = spend(&raw, &query.outputs).unwrap();
        assert_eq!(resolution.txid.as_deref(), Some("bb"));
        assert_eq!(resolution.block, Some(600_000));
        assert_eq!(
            resolution.send_outputs,
            vec![
                SendOutput::ZERO,
                SendOutput { token_qty: TokenQuantity(5), satoshis: 546 },
                SendOutput { token_qty: TokenQuantity(3), satoshis: 546 },
                SendOutput { token_qty: TokenQuantity::ZERO, satoshis: 10_000 },
            ]
        );
    }

    #[test]
    fn test_spend_requires_first_output() {
        let query = SpendQuery::new("aa", 1);
        let raw = record(json!({ "txid": "bb" }));
        assert!(matches!(
            spend(&raw, &query.outputs),
            Err(QueryError::MissingField(field)) if field == "bch0"
        ));
    }

    #[test]
    fn test_confirmation_absent_when_unconfirmed() {
        let pending = record(json!({ "txid": "aa", "block": null, "timestamp": null }));
        assert_eq!(confirmation(&pending).unwrap(), None);

        let mined = record(json!({ "txid": "aa", "block": 7, "timestamp": "2020-01-01 00:00" }));
        assert_eq!(
            confirmation(&mined).unwrap(),
            Some(Confirmation { block: 7, timestamp: Some("2020-01-01 00:00".into()) })
        );
    }

    #[test]
    fn test_mint_keeps_raw_hex() {
        let raw = record(json!({
            "txid": "cc",
            "versionTypeHex": "01",
            "block": null,
            "timestamp": null,
            "batonHex": "",
            "quantityHex": "0000000000000064"
        }));
        let event = mint(&raw).unwrap();
        assert_eq!(event.baton_hex, None);
        assert_eq!(event.quantity().unwrap(), TokenQuantity(100));
    }
}
