use alloy_primitives::{Address, U256};
use chain_rpc::units::format_units;
use shared::domain::TargetNetwork;

use crate::{
    connection::{ConnectionState, ConnectionStatus},
    value::{check_submission, FetchStatus, PendingWrite, StoredValue, TxStatus},
};

const BALANCE_PRECISION: u8 = 4;

/// `0x1234…abcd`
pub fn short_address(address: &Address) -> String {
    let digits = hex::encode(address);
    format!("0x{}…{}", &digits[..4], &digits[digits.len() - 4..])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Connect,
    SwitchNetwork,
    Disconnect(Address),
    Reconnect,
}

pub fn primary_action(state: &ConnectionState) -> PrimaryAction {
    match (state.status, state.address) {
        (ConnectionStatus::Connected, Some(address)) => PrimaryAction::Disconnect(address),
        (ConnectionStatus::WrongNetwork, _) => PrimaryAction::SwitchNetwork,
        (ConnectionStatus::WrongAccount, _) => PrimaryAction::Reconnect,
        _ => PrimaryAction::Connect,
    }
}

pub fn action_label(action: PrimaryAction, target: &TargetNetwork) -> String {
    match action {
        PrimaryAction::Connect => "Connect Wallet".to_string(),
        PrimaryAction::SwitchNetwork => format!("Switch to {}", target.chain_name),
        PrimaryAction::Disconnect(address) => format!("Disconnect ({})", short_address(&address)),
        PrimaryAction::Reconnect => "Reconnect".to_string(),
    }
}

pub fn status_line(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "Connected",
        ConnectionStatus::WrongNetwork => "Wrong Network",
        ConnectionStatus::WrongAccount => "Wrong Account – reconnect required",
        ConnectionStatus::Disconnected => "Not Connected",
    }
}

pub fn network_label(state: &ConnectionState, target: &TargetNetwork) -> String {
    match state.chain_id {
        Some(chain_id) if target.matches(chain_id) => target.chain_name.clone(),
        Some(chain_id) => format!("chain {chain_id} (expected {})", target.chain_name),
        None => "-".to_string(),
    }
}

pub fn value_label(value: &StoredValue) -> String {
    match (value.fetch_status, value.raw) {
        (FetchStatus::Fetching, _) => "Loading…".to_string(),
        (FetchStatus::Failed, _) => "Error loading value".to_string(),
        (_, Some(raw)) => raw.to_string(),
        (_, None) => "-".to_string(),
    }
}

pub fn write_status_line(write: &PendingWrite) -> Option<String> {
    match &write.tx_status {
        TxStatus::Idle => None,
        TxStatus::Submitting => Some("Submitting transaction…".to_string()),
        TxStatus::AwaitingConfirmation(hash) => Some(format!("Waiting for confirmation of {hash}")),
        TxStatus::Succeeded(hash) => Some(format!("Value updated ({hash})")),
        TxStatus::Failed(reason) => Some(format!("Error: {reason}")),
    }
}

pub fn balance_label(balance: Option<U256>, target: &TargetNetwork) -> String {
    let currency = &target.native_currency;
    match balance {
        Some(amount) => format!(
            "{} {}",
            format_units(amount, currency.decimals, BALANCE_PRECISION),
            currency.symbol
        ),
        None => format!("- {}", currency.symbol),
    }
}

pub fn can_submit(input: &str, state: &ConnectionState, write: &PendingWrite) -> bool {
    write.tx_status != TxStatus::Submitting && check_submission(input, state).is_ok()
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
