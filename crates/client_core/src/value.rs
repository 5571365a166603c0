use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chain_rpc::{set_value_transaction, units::parse_decimal, StorageContract};
use reqwest::Client;
use shared::protocol::{ValueResponse, VALUE_ROUTE};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    connection::ConnectionState,
    error::{failure_reason, FetchError, SubmitError, SubmitRejection, WalletError},
    events::DappEvent,
    provider::WalletProvider,
};

#[async_trait]
pub trait ValueSource: Send + Sync {
    async fn read_value(&self) -> Result<U256, FetchError>;
}

pub struct ProxyValueSource {
    http: Client,
    value_url: String,
}

impl ProxyValueSource {
    pub fn new(backend_url: &str) -> Self {
        Self::with_client(Client::new(), backend_url)
    }

    pub fn with_client(http: Client, backend_url: &str) -> Self {
        Self {
            http,
            value_url: format!("{}{VALUE_ROUTE}", backend_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ValueSource for ProxyValueSource {
    async fn read_value(&self) -> Result<U256, FetchError> {
        let res = self.http.get(&self.value_url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: ValueResponse = res
            .json()
            .await
            .map_err(|err| FetchError::Malformed(err.to_string()))?;
        parse_decimal(&body.value).map_err(|err| FetchError::Malformed(err.to_string()))
    }
}

pub struct ChainValueSource {
    contract: StorageContract,
}

impl ChainValueSource {
    pub fn new(contract: StorageContract) -> Self {
        Self { contract }
    }
}

#[async_trait]
impl ValueSource for ChainValueSource {
    async fn read_value(&self) -> Result<U256, FetchError> {
        Ok(self.contract.get_value().await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed,
}

/// `raw` is `None` whenever `fetch_status` is `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredValue {
    pub raw: Option<U256>,
    pub fetch_status: FetchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxStatus {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation(TxHash),
    Succeeded(TxHash),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingWrite {
    pub input: String,
    pub tx_status: TxStatus,
}

pub fn check_submission(input: &str, connection: &ConnectionState) -> Result<U256, SubmitRejection> {
    if !connection.is_usable() {
        return Err(SubmitRejection::NotUsable(connection.status));
    }
    Ok(parse_decimal(input)?)
}

pub struct ValueSynchronizer {
    source: Arc<dyn ValueSource>,
    provider: Arc<dyn WalletProvider>,
    contract_address: Address,
    value: StoredValue,
    write: PendingWrite,
    events: broadcast::Sender<DappEvent>,
}

impl ValueSynchronizer {
    pub fn new(
        source: Arc<dyn ValueSource>,
        provider: Arc<dyn WalletProvider>,
        contract_address: Address,
        events: broadcast::Sender<DappEvent>,
    ) -> Self {
        Self {
            source,
            provider,
            contract_address,
            value: StoredValue::default(),
            write: PendingWrite::default(),
            events,
        }
    }

    pub fn value(&self) -> &StoredValue {
        &self.value
    }

    pub fn write(&self) -> &PendingWrite {
        &self.write
    }

    pub async fn fetch_value(&mut self) -> Result<U256, FetchError> {
        self.set_value(StoredValue {
            raw: self.value.raw,
            fetch_status: FetchStatus::Fetching,
        });

        match self.source.read_value().await {
            Ok(raw) => {
                debug!(%raw, "stored value refreshed");
                self.set_value(StoredValue {
                    raw: Some(raw),
                    fetch_status: FetchStatus::Ready,
                });
                Ok(raw)
            }
            Err(err) => {
                warn!(%err, "stored value read failed");
                self.set_value(StoredValue {
                    raw: None,
                    fetch_status: FetchStatus::Failed,
                });
                Err(err)
            }
        }
    }

    pub async fn submit_value(
        &mut self,
        input: &str,
        connection: &ConnectionState,
    ) -> Result<TxHash, SubmitError> {
        let amount = check_submission(input, connection)?;
        let Some(from) = connection.address else {
            return Err(SubmitRejection::NotUsable(connection.status).into());
        };

        self.set_write(PendingWrite {
            input: input.to_string(),
            tx_status: TxStatus::Submitting,
        });

        let tx = set_value_transaction(from, self.contract_address, amount);
        match self.provider.send_transaction(tx).await {
            Ok(tx_hash) => {
                info!(%tx_hash, %amount, "setValue accepted by wallet");
                self.set_write(PendingWrite {
                    input: input.to_string(),
                    tx_status: TxStatus::AwaitingConfirmation(tx_hash),
                });
                Ok(tx_hash)
            }
            Err(err) => {
                warn!(%err, %amount, "setValue submission failed");
                self.set_write(PendingWrite {
                    input: input.to_string(),
                    tx_status: TxStatus::Failed(failure_reason(&err)),
                });
                Err(err.into())
            }
        }
    }

    /// Finishes a write once the confirmation strategy resolves. Resolutions
    /// for anything but the current pending hash are dropped.
    pub async fn complete_confirmation(
        &mut self,
        tx_hash: TxHash,
        outcome: Result<(), WalletError>,
    ) {
        if self.write.tx_status != TxStatus::AwaitingConfirmation(tx_hash) {
            debug!(%tx_hash, "ignoring confirmation for a write that is no longer pending");
            return;
        }

        if let Err(err) = outcome {
            warn!(%tx_hash, %err, "transaction confirmation failed");
            let input = self.write.input.clone();
            self.set_write(PendingWrite {
                input,
                tx_status: TxStatus::Failed(failure_reason(&err)),
            });
            return;
        }

        match self.fetch_value().await {
            Ok(_) => {
                info!(%tx_hash, "write presumed confirmed");
                self.set_write(PendingWrite {
                    input: String::new(),
                    tx_status: TxStatus::Succeeded(tx_hash),
                });
            }
            Err(err) => {
                let input = self.write.input.clone();
                self.set_write(PendingWrite {
                    input,
                    tx_status: TxStatus::Failed(format!("value refresh failed: {err}")),
                });
            }
        }
    }

    fn set_value(&mut self, next: StoredValue) {
        if next != self.value {
            self.value = next;
            let _ = self.events.send(DappEvent::ValueChanged(self.value.clone()));
        }
    }

    fn set_write(&mut self, next: PendingWrite) {
        if next != self.write {
            self.write = next;
            let _ = self.events.send(DappEvent::WriteChanged(self.write.clone()));
        }
    }
}

#[cfg(test)]
#[path = "tests/value_tests.rs"]
mod tests;
