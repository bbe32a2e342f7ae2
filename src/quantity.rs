//! Token quantities and their wire codec
//!
//! Amounts travel as 16 hex characters: a big-endian high word followed by a
//! big-endian low word. The decoded value is `high * 2^32 + low`, computed in
//! integer arithmetic so amounts above 2^53 stay exact.
//!
//! Persisted quantities serialize as decimal strings for the same reason.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Encoded quantity length in bytes
pub const QUANTITY_LEN: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {QUANTITY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid decimal quantity: {0}")]
    InvalidDecimal(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenQuantity(pub u64);

impl TokenQuantity {
    pub const ZERO: TokenQuantity = TokenQuantity(0);

    pub fn from_words(high: u32, low: u32) -> Self {
        Self((u64::from(high) << 32) | u64::from(low))
    }

    pub fn high(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn low(&self) -> u32 {
        self.0 as u32
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: TokenQuantity) -> Option<TokenQuantity> {
        self.0.checked_add(other.0).map(TokenQuantity)
    }

    /// Decode the two-word hex form
    pub fn from_hex(encoded: &str) -> Result<Self, QuantityError> {
        let bytes = hex::decode(encoded)?;
        let bytes: [u8; QUANTITY_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| QuantityError::InvalidLength(bytes.len()))?;

        let high = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let low = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::from_words(high, low))
    }

    /// Encode as the two-word hex form
    pub fn to_hex(&self) -> String {
        let mut bytes = [0u8; QUANTITY_LEN];
        bytes[..4].copy_from_slice(&self.high().to_be_bytes());
        bytes[4..].copy_from_slice(&self.low().to_be_bytes());
        hex::encode(bytes)
    }
}

impl From<u64> for TokenQuantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TokenQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenQuantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(TokenQuantity)
            .map_err(|_| QuantityError::InvalidDecimal(s.to_string()))
    }
}

impl Serialize for TokenQuantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenQuantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(TokenQuantity(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_combines_words() {
        let qty = TokenQuantity::from_hex("0000000100000002").unwrap();
        assert_eq!(qty.as_u64(), (1u64 << 32) + 2);
    }

    #[test]
    fn test_word_pairs_round_trip() {
        let pairs = [
            (0u32, 0u32),
            (0, 1),
            (1, 0),
            (0x0020_0000, 1),
            (0xFFFF_FFFF, 0),
            (0, 0xFFFF_FFFF),
            (0xFFFF_FFFF, 0xFFFF_FFFF),
        ];
        for (high, low) in pairs {
            let encoded = TokenQuantity::from_words(high, low).to_hex();
            let decoded = TokenQuantity::from_hex(&encoded).unwrap();
            assert_eq!(decoded.as_u64(), u64::from(high) * (1u64 << 32) + u64::from(low));
            assert_eq!((decoded.high(), decoded.low()), (high, low));
        }
    }

    #[test]
    fn test_exact_above_float_precision() {
        // 2^53 + 1 is not representable as f64
        let qty = TokenQuantity::from_hex("0020000000000001").unwrap();
        assert_eq!(qty.as_u64(), 9_007_199_254_740_993);
        assert_eq!(qty.to_string(), "9007199254740993");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            TokenQuantity::from_hex("zz00000000000000"),
            Err(QuantityError::InvalidHex(_))
        ));
        assert_eq!(
            TokenQuantity::from_hex("00000001"),
            Err(QuantityError::InvalidLength(4))
        );
        assert_eq!(
            TokenQuantity::from_hex(""),
            Err(QuantityError::InvalidLength(0))
        );
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let qty = TokenQuantity(u64::MAX);
        let json = serde_json::to_string(&qty).unwrap();
        assert_eq!(json, "\"18446744073709551615\"");
        let back: TokenQuantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, qty);
        let from_number: TokenQuantity = serde_json::from_str("42").unwrap();
        assert_eq!(from_number, TokenQuantity(42));
    }
}
