use serde::Serialize;

use crate::ledger::TokenDetails;
use crate::quantity::TokenQuantity;

use super::error::{QueryError, Result};

/// A baton index points at a real output only inside (1, 256)
pub fn is_valid_baton(vout: u64) -> bool {
    vout > 1 && vout < 256
}

/// Genesis metadata decoded from a genesis lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisDetails {
    pub token_id_hex: String,
    pub version_type: u8,
    /// Block time, only when the genesis is confirmed
    pub timestamp: Option<String>,
    pub symbol: String,
    pub name: String,
    pub document_uri: String,
    #[serde(with = "hex_bytes")]
    pub document_sha256: Option<Vec<u8>>,
    pub decimals: u32,
    pub baton_vout: Option<u32>,
    pub contains_baton: bool,
    pub genesis_quantity: TokenQuantity,
}

impl GenesisDetails {
    pub fn to_token_details(&self) -> TokenDetails {
        TokenDetails {
            token_id_hex: self.token_id_hex.clone(),
            version_type: self.version_type,
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            document_uri: self.document_uri.clone(),
            document_sha256_hex: self.document_sha256.as_ref().map(hex::encode),
            decimals: self.decimals,
            baton_vout: self.baton_vout,
            genesis_or_mint_quantity: self.genesis_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintEvent {
    pub txid: String,
    pub version_type_hex: Option<String>,
    pub block: Option<u64>,
    pub timestamp: Option<String>,
    pub baton_hex: Option<String>,
    pub quantity_hex: Option<String>,
}

impl MintEvent {
    /// Minted amount; a mint without a quantity push mints nothing
    pub fn quantity(&self) -> Result<TokenQuantity> {
        match self.quantity_hex.as_deref() {
            None | Some("") => Ok(TokenQuantity::ZERO),
            Some(encoded) => TokenQuantity::from_hex(encoded)
                .map_err(|err| QueryError::decode("quantityHex", err)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutput {
    pub token_qty: TokenQuantity,
    pub satoshis: u64,
}

impl SendOutput {
    pub const ZERO: SendOutput = SendOutput {
        token_qty: TokenQuantity::ZERO,
        satoshis: 0,
    };
}

/// Who spent an output and how the spender redistributed the tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendResolution {
    pub txid: Option<String>,
    pub token_id: Option<String>,
    pub block: Option<u64>,
    pub timestamp: Option<String>,
    /// Indexed by output; output 0 is always present
    pub send_outputs: Vec<SendOutput>,
}

impl SpendResolution {
    /// Result for an output no recognized transaction spends
    pub fn burn() -> Self {
        Self {
            txid: None,
            token_id: None,
            block: None,
            timestamp: None,
            send_outputs: vec![SendOutput::ZERO],
        }
    }

    pub fn is_burn(&self) -> bool {
        self.txid.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub block: u64,
    pub timestamp: Option<String>,
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }
}
