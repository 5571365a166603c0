//! The cooperative event loop that owns connection and value state.

use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use shared::domain::TargetNetwork;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{
    confirmation::{ConfirmationStrategy, FixedDelayConfirmation},
    connection::{ConnectionController, ConnectionState, Reconciliation, SwitchOutcome},
    error::{failure_reason, SubmitError, WalletError},
    events::{DappEvent, WalletEvent},
    provider::WalletProvider,
    value::{PendingWrite, StoredValue, ValueSource, ValueSynchronizer},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Connect,
    Disconnect,
    SwitchToTarget,
    RefreshValue,
    SubmitValue(String),
    Shutdown,
}

#[derive(Debug)]
pub enum SessionInput {
    Command(UserCommand),
    Wallet(WalletEvent),
    ConfirmationElapsed {
        tx_hash: TxHash,
        outcome: Result<(), WalletError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dapp session is no longer running")]
pub struct SessionClosed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub balance: Option<U256>,
    pub value: StoredValue,
    pub write: PendingWrite,
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
    events: broadcast::Sender<DappEvent>,
}

impl SessionHandle {
    pub fn send(&self, command: UserCommand) -> Result<(), SessionClosed> {
        self.tx
            .send(SessionInput::Command(command))
            .map_err(|_| SessionClosed)
    }

    pub fn wallet_event(&self, event: WalletEvent) -> Result<(), SessionClosed> {
        self.tx
            .send(SessionInput::Wallet(event))
            .map_err(|_| SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DappEvent> {
        self.events.subscribe()
    }
}

pub struct DappSession {
    controller: ConnectionController,
    synchronizer: ValueSynchronizer,
    confirmation: Arc<dyn ConfirmationStrategy>,
    inbox_tx: mpsc::WeakUnboundedSender<SessionInput>,
    inbox: mpsc::UnboundedReceiver<SessionInput>,
    events: broadcast::Sender<DappEvent>,
}

impl DappSession {
    pub fn new(
        target: TargetNetwork,
        contract_address: Address,
        provider: Arc<dyn WalletProvider>,
        source: Arc<dyn ValueSource>,
    ) -> (Self, SessionHandle) {
        Self::new_with_dependencies(
            target,
            contract_address,
            provider,
            source,
            Arc::new(FixedDelayConfirmation::default()),
        )
    }

    pub fn new_with_dependencies(
        target: TargetNetwork,
        contract_address: Address,
        provider: Arc<dyn WalletProvider>,
        source: Arc<dyn ValueSource>,
        confirmation: Arc<dyn ConfirmationStrategy>,
    ) -> (Self, SessionHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let session = Self {
            controller: ConnectionController::new(provider.clone(), target, events.clone()),
            synchronizer: ValueSynchronizer::new(
                source,
                provider,
                contract_address,
                events.clone(),
            ),
            confirmation,
            inbox_tx: tx.downgrade(),
            inbox,
            events: events.clone(),
        };
        (session, SessionHandle { tx, events })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.controller.state().clone(),
            balance: self.controller.balance(),
            value: self.synchronizer.value().clone(),
            write: self.synchronizer.write().clone(),
        }
    }

    pub async fn run(mut self) -> SessionSnapshot {
        let _ = self.synchronizer.fetch_value().await;

        while let Some(input) = self.inbox.recv().await {
            if !self.handle(input).await {
                break;
            }
        }

        info!("dapp session stopped");
        self.snapshot()
    }

    /// Returns `false` once the session should stop.
    pub async fn handle(&mut self, input: SessionInput) -> bool {
        match input {
            SessionInput::Command(command) => return self.handle_command(command).await,
            SessionInput::Wallet(event) => self.handle_wallet_event(event).await,
            SessionInput::ConfirmationElapsed { tx_hash, outcome } => {
                self.synchronizer
                    .complete_confirmation(tx_hash, outcome)
                    .await;
            }
        }
        true
    }

    async fn handle_command(&mut self, command: UserCommand) -> bool {
        let command_name = match &command {
            UserCommand::Connect => "connect",
            UserCommand::Disconnect => "disconnect",
            UserCommand::SwitchToTarget => "switch_to_target",
            UserCommand::RefreshValue => "refresh_value",
            UserCommand::SubmitValue(_) => "submit_value",
            UserCommand::Shutdown => "shutdown",
        };
        debug!(command = command_name, "handling session command");

        match command {
            UserCommand::Connect => {
                if let Err(err) = self.controller.connect().await {
                    self.notice(failure_reason(&err));
                }
            }
            UserCommand::Disconnect => self.controller.disconnect(),
            UserCommand::SwitchToTarget => match self.controller.switch_to_target().await {
                Ok(SwitchOutcome::Switched) => {
                    let _ = self.synchronizer.fetch_value().await;
                }
                Ok(SwitchOutcome::ChainAdded) => {
                    let name = self.controller.target().chain_name.clone();
                    self.notice(format!("{name} was added to the wallet; switch again to use it"));
                }
                Ok(SwitchOutcome::NotConnected) => self.notice("Connect a wallet first"),
                Ok(SwitchOutcome::AlreadyOnTarget) => {}
                Err(err) => self.notice(format!("Network switch failed: {err}")),
            },
            UserCommand::RefreshValue => {
                let _ = self.synchronizer.fetch_value().await;
            }
            UserCommand::SubmitValue(input) => self.submit(&input).await,
            UserCommand::Shutdown => return false,
        }
        true
    }

    async fn handle_wallet_event(&mut self, event: WalletEvent) {
        let reconciliation = match &event {
            WalletEvent::AccountsChanged(accounts) => self.controller.on_accounts_changed(accounts),
            WalletEvent::ChainChanged(chain_id) => self.controller.on_chain_changed(*chain_id),
        };
        debug!(?event, ?reconciliation, "wallet event applied");

        if reconciliation == Reconciliation::RefreshRequested {
            self.controller.refresh_balance().await;
            let _ = self.synchronizer.fetch_value().await;
        }
    }

    async fn submit(&mut self, input: &str) {
        let connection = self.controller.state().clone();
        match self.synchronizer.submit_value(input, &connection).await {
            Ok(tx_hash) => self.schedule_confirmation(tx_hash),
            Err(SubmitError::Rejected(rejection)) => {
                warn!(%rejection, "write rejected before reaching the wallet");
                self.notice(rejection.to_string());
            }
            Err(SubmitError::Wallet(err)) => self.notice(failure_reason(&err)),
        }
    }

    fn schedule_confirmation(&self, tx_hash: TxHash) {
        let Some(tx) = self.inbox_tx.upgrade() else {
            warn!(%tx_hash, "session inbox closed; confirmation will not be tracked");
            return;
        };
        let confirmation = self.confirmation.clone();
        tokio::spawn(async move {
            let outcome = confirmation.wait_for_confirmation(tx_hash).await;
            let _ = tx.send(SessionInput::ConfirmationElapsed { tx_hash, outcome });
        });
    }

    fn notice(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "session notice");
        let _ = self.events.send(DappEvent::Notice(message));
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
