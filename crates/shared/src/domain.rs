use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(ChainId);

pub const AVALANCHE_FUJI_CHAIN_ID: ChainId = ChainId(43_113);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid chain id '{0}'")]
pub struct ChainIdParseError(pub String);

impl ChainId {
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    /// Accepts either a `0x`-prefixed quantity or a plain decimal number.
    pub fn parse(raw: &str) -> Result<Self, ChainIdParseError> {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| ChainIdParseError(raw.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNetwork {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_url: String,
    pub block_explorer_url: String,
    pub native_currency: NativeCurrency,
}

impl TargetNetwork {
    pub fn avalanche_fuji() -> Self {
        Self {
            chain_id: AVALANCHE_FUJI_CHAIN_ID,
            chain_name: "Avalanche Fuji Testnet".into(),
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".into(),
            block_explorer_url: "https://testnet.snowtrace.io".into(),
            native_currency: NativeCurrency {
                name: "AVAX".into(),
                symbol: "AVAX".into(),
                decimals: 18,
            },
        }
    }

    pub fn matches(&self, chain_id: ChainId) -> bool {
        self.chain_id == chain_id
    }
}

impl Default for TargetNetwork {
    fn default() -> Self {
        Self::avalanche_fuji()
    }
}
