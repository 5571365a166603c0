use std::sync::Arc;

use alloy_primitives::{Address, U256};
use shared::domain::{ChainId, TargetNetwork};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{error::WalletError, events::DappEvent, provider::WalletProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    WrongNetwork,
    /// The wallet reported a different account than the one connected;
    /// the user has to reconnect explicitly.
    WrongAccount,
}

/// `address` is present exactly when `status != Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl ConnectionState {
    pub fn is_usable(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    AlreadyOnTarget,
    ChainAdded,
    NotConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Updated,
    RefreshRequested,
}

pub struct ConnectionController {
    provider: Arc<dyn WalletProvider>,
    target: TargetNetwork,
    state: ConnectionState,
    balance: Option<U256>,
    events: broadcast::Sender<DappEvent>,
}

impl ConnectionController {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        target: TargetNetwork,
        events: broadcast::Sender<DappEvent>,
    ) -> Self {
        Self {
            provider,
            target,
            state: ConnectionState::default(),
            balance: None,
            events,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn balance(&self) -> Option<U256> {
        self.balance
    }

    pub fn target(&self) -> &TargetNetwork {
        &self.target
    }

    pub fn is_usable(&self) -> bool {
        self.state.is_usable()
    }

    pub async fn connect(&mut self) -> Result<(), WalletError> {
        if !self.provider.is_available() {
            warn!("connect requested but no wallet provider is available");
            return Err(WalletError::ProviderAbsent);
        }

        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(%err, "account access request failed");
                self.set_state(ConnectionState::default());
                return Err(err);
            }
        };
        let Some(address) = accounts.first().copied() else {
            info!("wallet granted no accounts");
            self.set_state(ConnectionState::default());
            return Ok(());
        };

        let chain_id = match self.provider.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                warn!(%address, %err, "chain id query failed after account access");
                self.set_state(ConnectionState::default());
                return Err(err);
            }
        };

        let status = self.status_for(chain_id);
        info!(%address, %chain_id, ?status, "wallet connected");
        self.set_state(ConnectionState {
            status,
            address: Some(address),
            chain_id: Some(chain_id),
        });
        self.refresh_balance().await;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.state.status != ConnectionStatus::Disconnected {
            info!("wallet disconnected");
        }
        self.set_state(ConnectionState::default());
    }

    pub async fn switch_to_target(&mut self) -> Result<SwitchOutcome, WalletError> {
        if self.state.status == ConnectionStatus::Disconnected {
            return Ok(SwitchOutcome::NotConnected);
        }
        let target_id = self.target.chain_id;
        if self.state.chain_id == Some(target_id) {
            return Ok(SwitchOutcome::AlreadyOnTarget);
        }

        match self.provider.switch_chain(target_id).await {
            Ok(()) => {
                info!(chain_id = %target_id, "wallet switched to target chain");
                if self.apply_chain(target_id) == Reconciliation::RefreshRequested {
                    self.refresh_balance().await;
                }
                Ok(SwitchOutcome::Switched)
            }
            Err(WalletError::UnrecognizedChain) => {
                info!(
                    chain_id = %target_id,
                    chain_name = %self.target.chain_name,
                    "wallet does not know target chain; requesting add"
                );
                self.provider.add_chain(&self.target).await.map_err(|err| {
                    warn!(%err, "add chain request failed");
                    err
                })?;
                Ok(SwitchOutcome::ChainAdded)
            }
            Err(err) => {
                warn!(chain_id = %target_id, %err, "chain switch failed");
                Err(err)
            }
        }
    }

    pub fn on_accounts_changed(&mut self, accounts: &[Address]) -> Reconciliation {
        if self.state.status == ConnectionStatus::Disconnected {
            debug!("ignoring accounts change while disconnected");
            return Reconciliation::Unchanged;
        }

        let Some(reported) = accounts.first().copied() else {
            info!("wallet revoked account access");
            self.set_state(ConnectionState::default());
            return Reconciliation::Updated;
        };

        if Some(reported) == self.state.address {
            if self.state.status != ConnectionStatus::WrongAccount {
                return Reconciliation::Unchanged;
            }
            // Back on the connected account; re-derive from the chain.
            let status = self
                .state
                .chain_id
                .map(|chain_id| self.status_for(chain_id))
                .unwrap_or(ConnectionStatus::WrongNetwork);
            self.set_state(ConnectionState {
                status,
                ..self.state.clone()
            });
            return if status == ConnectionStatus::Connected {
                Reconciliation::RefreshRequested
            } else {
                Reconciliation::Updated
            };
        }

        warn!(
            connected = ?self.state.address,
            %reported,
            "wallet switched accounts; reconnect required"
        );
        self.set_state(ConnectionState {
            status: ConnectionStatus::WrongAccount,
            ..self.state.clone()
        });
        Reconciliation::Updated
    }

    pub fn on_chain_changed(&mut self, chain_id: ChainId) -> Reconciliation {
        if self.state.status == ConnectionStatus::Disconnected {
            debug!(%chain_id, "ignoring chain change while disconnected");
            return Reconciliation::Unchanged;
        }
        self.apply_chain(chain_id)
    }

    pub async fn refresh_balance(&mut self) {
        let address = match (self.state.status, self.state.address) {
            (ConnectionStatus::Connected, Some(address)) => address,
            _ => {
                self.set_balance(None);
                return;
            }
        };

        match self.provider.balance(address).await {
            Ok(balance) => self.set_balance(Some(balance)),
            Err(err) => {
                warn!(%address, %err, "balance query failed");
                self.set_balance(None);
            }
        }
    }

    fn apply_chain(&mut self, chain_id: ChainId) -> Reconciliation {
        let mut next = self.state.clone();
        next.chain_id = Some(chain_id);
        if matches!(
            next.status,
            ConnectionStatus::Connected | ConnectionStatus::WrongNetwork
        ) {
            next.status = self.status_for(chain_id);
        }

        if next == self.state {
            return Reconciliation::Unchanged;
        }
        let on_target = next.status == ConnectionStatus::Connected;
        info!(%chain_id, status = ?next.status, "wallet chain changed");
        self.set_state(next);

        if on_target {
            Reconciliation::RefreshRequested
        } else {
            Reconciliation::Updated
        }
    }

    fn status_for(&self, chain_id: ChainId) -> ConnectionStatus {
        if self.target.matches(chain_id) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::WrongNetwork
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        debug_assert_eq!(
            next.address.is_some(),
            next.status != ConnectionStatus::Disconnected
        );
        if next.status != ConnectionStatus::Connected {
            self.set_balance(None);
        }
        if next != self.state {
            self.state = next;
            let _ = self
                .events
                .send(DappEvent::ConnectionChanged(self.state.clone()));
        }
    }

    fn set_balance(&mut self, balance: Option<U256>) {
        if balance != self.balance {
            self.balance = balance;
            let _ = self.events.send(DappEvent::BalanceChanged(balance));
        }
    }
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
