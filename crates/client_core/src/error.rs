use chain_rpc::{units::UnitsError, RpcError};
use serde_json::Value;
use thiserror::Error;

use crate::connection::ConnectionStatus;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3085/3326: the wallet does not know the requested chain.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC internal error; some wallets wrap the real code inside `data`.
pub const INTERNAL_ERROR_CODE: i64 = -32603;
pub const EXECUTION_REVERTED_CODE: i64 = 3;

pub const DEFAULT_FAILURE_REASON: &str = "Transaction failed";

const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet not detected")]
    ProviderAbsent,
    #[error("user rejected the request")]
    UserRejected,
    #[error("chain is not recognized by the wallet")]
    UnrecognizedChain,
    #[error("wallet request timed out")]
    Timeout,
    #[error("execution reverted: {reason}")]
    Reverted { reason: String },
    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("wallet transport failure: {0}")]
    Transport(String),
    #[error("unexpected wallet response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("value endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("value endpoint returned http status {0}")]
    Status(u16),
    #[error("malformed value: {0}")]
    Malformed(String),
    #[error("contract read failed: {0}")]
    Rpc(#[from] RpcError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("wallet is not ready for writes ({0:?})")]
    NotUsable(ConnectionStatus),
    #[error("invalid value: {0}")]
    InvalidInput(#[from] UnitsError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] SubmitRejection),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

pub fn classify_rpc_error(err: &RpcError) -> WalletError {
    match err {
        RpcError::Transport(_) if err.is_timeout() => WalletError::Timeout,
        RpcError::Transport(inner) => WalletError::Transport(inner.to_string()),
        RpcError::Status(status) => WalletError::Transport(format!("http status {status}")),
        RpcError::Malformed(message) => WalletError::Malformed(message.clone()),
        RpcError::Rpc {
            code,
            message,
            data,
        } => classify_error_object(*code, message, data.as_ref()),
    }
}

fn classify_error_object(code: i64, message: &str, data: Option<&Value>) -> WalletError {
    let effective_code = if code == INTERNAL_ERROR_CODE {
        data.and_then(nested_code).unwrap_or(code)
    } else {
        code
    };
    let lower = message.to_ascii_lowercase();

    if effective_code == USER_REJECTED_CODE
        || lower.contains("user rejected")
        || lower.contains("user denied")
    {
        return WalletError::UserRejected;
    }
    if effective_code == UNRECOGNIZED_CHAIN_CODE || lower.contains("unrecognized chain") {
        return WalletError::UnrecognizedChain;
    }
    if effective_code == EXECUTION_REVERTED_CODE || lower.contains("execution reverted") {
        return WalletError::Reverted {
            reason: revert_reason(message, data),
        };
    }
    if lower.contains("timeout") || lower.contains("timed out") {
        return WalletError::Timeout;
    }

    WalletError::Rpc {
        code,
        message: message.to_string(),
    }
}

fn nested_code(data: &Value) -> Option<i64> {
    data.get("originalError")
        .and_then(|original| original.get("code"))
        .or_else(|| data.get("code"))
        .and_then(Value::as_i64)
}

fn revert_reason(message: &str, data: Option<&Value>) -> String {
    if let Some(reason) = data
        .and_then(|data| data.as_str().or_else(|| data.get("data").and_then(Value::as_str)))
        .and_then(decode_revert_string)
    {
        return reason;
    }

    let trimmed = message.trim();
    match trimmed.split_once(':') {
        Some((_, reason)) if !reason.trim().is_empty() => reason.trim().to_string(),
        _ => "execution reverted".to_string(),
    }
}

fn decode_revert_string(data: &str) -> Option<String> {
    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).ok()?;
    let payload = bytes.strip_prefix(ERROR_STRING_SELECTOR.as_slice())?;
    let (high, low) = payload.get(32..64)?.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let len = usize::try_from(u64::from_be_bytes(low.try_into().ok()?)).ok()?;
    let text = payload.get(64..64usize.checked_add(len)?)?;
    String::from_utf8(text.to_vec()).ok()
}

pub fn failure_reason(err: &WalletError) -> String {
    match err {
        WalletError::ProviderAbsent => "Wallet not detected".to_string(),
        WalletError::UserRejected => "User rejected the request.".to_string(),
        WalletError::Timeout => "The request timed out.".to_string(),
        WalletError::Reverted { reason } => format!("Execution reverted: {reason}"),
        WalletError::Rpc { message, .. } if !message.trim().is_empty() => message.trim().to_string(),
        WalletError::Rpc { .. }
        | WalletError::UnrecognizedChain
        | WalletError::Transport(_)
        | WalletError::Malformed(_) => DEFAULT_FAILURE_REASON.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
