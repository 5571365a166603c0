//! Calldata for the two functions the storage contract exposes.

use alloy_primitives::U256;
use thiserror::Error;

/// `keccak256("getValue()")[..4]`
pub const GET_VALUE_SELECTOR: [u8; 4] = [0x20, 0x96, 0x52, 0x55];
/// `keccak256("setValue(uint256)")[..4]`
pub const SET_VALUE_SELECTOR: [u8; 4] = [0x55, 0x24, 0x10, 0x77];

const WORD_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("return data is not valid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes of return data, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },
}

pub fn encode_get_value() -> Vec<u8> {
    GET_VALUE_SELECTOR.to_vec()
}

pub fn encode_set_value(value: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(SET_VALUE_SELECTOR.len() + WORD_LEN);
    data.extend_from_slice(&SET_VALUE_SELECTOR);
    data.extend_from_slice(&value.to_be_bytes::<WORD_LEN>());
    data
}

pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a single `uint256` return word. An empty `0x` (no code at the
/// address) or a truncated word is rejected rather than read as zero.
pub fn decode_uint256(raw: &str) -> Result<U256, AbiError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|err| AbiError::InvalidHex(err.to_string()))?;
    let word: [u8; WORD_LEN] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| AbiError::UnexpectedLength {
                expected: WORD_LEN,
                actual: bytes.len(),
            })?;
    Ok(U256::from_be_bytes(word))
}
