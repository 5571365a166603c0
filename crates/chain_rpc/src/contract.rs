use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{abi, JsonRpcClient, RpcError};

#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    pub to: Address,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: String,
}

pub fn set_value_transaction(from: Address, contract: Address, value: U256) -> TransactionRequest {
    TransactionRequest {
        from,
        to: contract,
        data: abi::to_hex_data(&abi::encode_set_value(value)),
    }
}

pub struct StorageContract {
    rpc: JsonRpcClient,
    address: Address,
}

impl StorageContract {
    pub fn new(rpc: JsonRpcClient, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn endpoint(&self) -> &Url {
        self.rpc.endpoint()
    }

    pub async fn get_value(&self) -> Result<U256, RpcError> {
        let call = CallRequest {
            to: self.address,
            data: abi::to_hex_data(&abi::encode_get_value()),
        };
        let raw: String = self.rpc.request("eth_call", (call, "latest")).await?;
        let value = abi::decode_uint256(&raw).map_err(|err| RpcError::Malformed(err.to_string()))?;
        debug!(contract = %self.address, %value, "read stored value");
        Ok(value)
    }
}
