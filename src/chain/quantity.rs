//! Numeric quantity decoding
//!
//! Nodes report numbers either as JSON numbers, `0x`-prefixed hex strings
//! or plain decimal strings. All three decode to the same value.

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

/// Failure to decode a numeric quantity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Empty quantity")]
    Empty,
    #[error("Invalid hex quantity: {0}")]
    InvalidHex(String),
    #[error("Invalid decimal quantity: {0}")]
    InvalidDecimal(String),
    #[error("Quantity out of range: {0}")]
    OutOfRange(String),
}

/// Parse a quantity string, hex when `0x`-prefixed, decimal otherwise
pub fn parse_quantity(raw: &str) -> Result<u128, QuantityError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuantityError::Empty);
    }

    if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if digits.is_empty() {
            return Err(QuantityError::InvalidHex(raw.to_string()));
        }
        return u128::from_str_radix(digits, 16)
            .map_err(|_| QuantityError::InvalidHex(raw.to_string()));
    }

    raw.parse::<u128>()
        .map_err(|_| QuantityError::InvalidDecimal(raw.to_string()))
}

/// Parse a quantity that must fit in 64 bits (heights, timestamps, counts)
pub fn parse_quantity_u64(raw: &str) -> Result<u64, QuantityError> {
    let value = parse_quantity(raw)?;
    u64::try_from(value).map_err(|_| QuantityError::OutOfRange(raw.to_string()))
}

/// Parse a quantity of up to 256 bits (node-reported total difficulty)
pub fn parse_quantity_u256(raw: &str) -> Result<U256, QuantityError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuantityError::Empty);
    }

    if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(QuantityError::InvalidHex(raw.to_string()));
        }
        return U256::from_str_radix(digits, 16)
            .map_err(|_| QuantityError::OutOfRange(raw.to_string()));
    }

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QuantityError::InvalidDecimal(raw.to_string()));
    }
    U256::from_dec_str(raw).map_err(|_| QuantityError::OutOfRange(raw.to_string()))
}

/// Encode a block height the way `eth_getBlockByNumber` expects it
pub fn to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(u64),
    Text(String),
}

impl RawQuantity {
    fn into_u128(self) -> Result<u128, QuantityError> {
        match self {
            RawQuantity::Number(n) => Ok(n as u128),
            RawQuantity::Text(s) => parse_quantity(&s),
        }
    }
}

/// serde helper for `U256` fields
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Number(n) => Ok(U256::from(n)),
        RawQuantity::Text(s) => parse_quantity_u256(&s).map_err(de::Error::custom),
    }
}

/// serde helper for `u128` fields
pub fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    RawQuantity::deserialize(deserializer)?
        .into_u128()
        .map_err(de::Error::custom)
}

/// serde helper for `u64` fields
pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_u128(deserializer)?;
    u64::try_from(value).map_err(|_| de::Error::custom(QuantityError::OutOfRange(value.to_string())))
}

/// serde helper for optional `u64` fields (missing or `null` map to `None`)
pub fn deserialize_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawQuantity>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => {
            let value = raw.into_u128().map_err(de::Error::custom)?;
            u64::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(QuantityError::OutOfRange(value.to_string())))
        }
    }
}
