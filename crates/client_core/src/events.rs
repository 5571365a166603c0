use alloy_primitives::{Address, U256};
use shared::domain::ChainId;

use crate::{
    connection::ConnectionState,
    value::{PendingWrite, StoredValue},
};

/// Wallet-originated notifications, delivered in the order the wallet emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DappEvent {
    ConnectionChanged(ConnectionState),
    BalanceChanged(Option<U256>),
    ValueChanged(StoredValue),
    WriteChanged(PendingWrite),
    Notice(String),
}
