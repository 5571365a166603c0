use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chain_rpc::{JsonRpcClient, TransactionRequest};
use serde::Serialize;
use serde_json::json;
use shared::domain::{ChainId, NativeCurrency, TargetNetwork};
use url::Url;

use crate::error::{classify_rpc_error, WalletError};

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `false` when no wallet is installed; nothing else should be called then.
    fn is_available(&self) -> bool {
        true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;
    async fn chain_id(&self) -> Result<ChainId, WalletError>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;
    async fn add_chain(&self, network: &TargetNetwork) -> Result<(), WalletError>;
    async fn balance(&self, address: Address) -> Result<U256, WalletError>;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError>;
}

pub struct MissingWalletProvider;

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn add_chain(&self, _network: &TargetNetwork) -> Result<(), WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn balance(&self, _address: Address) -> Result<U256, WalletError> {
        Err(WalletError::ProviderAbsent)
    }

    async fn send_transaction(&self, _tx: TransactionRequest) -> Result<TxHash, WalletError> {
        Err(WalletError::ProviderAbsent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl From<&TargetNetwork> for AddChainParameter {
    fn from(network: &TargetNetwork) -> Self {
        Self {
            chain_id: network.chain_id.to_hex(),
            chain_name: network.chain_name.clone(),
            native_currency: network.native_currency.clone(),
            rpc_urls: vec![network.rpc_url.clone()],
            block_explorer_urls: vec![network.block_explorer_url.clone()],
        }
    }
}

pub struct JsonRpcWalletProvider {
    rpc: JsonRpcClient,
}

impl JsonRpcWalletProvider {
    pub fn new(endpoint: Url) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint),
        }
    }

    pub fn with_client(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.rpc
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|err| classify_rpc_error(&err))
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.rpc
            .request("eth_accounts", json!([]))
            .await
            .map_err(|err| classify_rpc_error(&err))
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let raw: String = self
            .rpc
            .request("eth_chainId", json!([]))
            .await
            .map_err(|err| classify_rpc_error(&err))?;
        ChainId::parse(&raw).map_err(|err| WalletError::Malformed(err.to_string()))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.rpc
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id.to_hex() }]),
            )
            .await
            .map_err(|err| classify_rpc_error(&err))
    }

    async fn add_chain(&self, network: &TargetNetwork) -> Result<(), WalletError> {
        self.rpc
            .request("wallet_addEthereumChain", [AddChainParameter::from(network)])
            .await
            .map_err(|err| classify_rpc_error(&err))
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        self.rpc
            .request("eth_getBalance", json!([address, "latest"]))
            .await
            .map_err(|err| classify_rpc_error(&err))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        self.rpc
            .request("eth_sendTransaction", [tx])
            .await
            .map_err(|err| classify_rpc_error(&err))
    }
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
