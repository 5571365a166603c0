use super::*;
use serde_json::json;

fn rpc(code: i64, message: &str, data: Option<Value>) -> RpcError {
    RpcError::Rpc {
        code,
        message: message.to_string(),
        data,
    }
}

/// `Error(string)` revert payload for `reason`.
fn revert_data(reason: &str) -> String {
    let mut bytes = ERROR_STRING_SELECTOR.to_vec();
    let mut offset = [0u8; 32];
    offset[31] = 0x20;
    bytes.extend_from_slice(&offset);
    let mut len = [0u8; 32];
    len[24..].copy_from_slice(&(reason.len() as u64).to_be_bytes());
    bytes.extend_from_slice(&len);
    let mut text = reason.as_bytes().to_vec();
    text.resize(reason.len().div_ceil(32) * 32, 0);
    bytes.extend_from_slice(&text);
    format!("0x{}", hex::encode(bytes))
}

#[test]
fn user_rejection_is_recognized_by_code_and_by_message() {
    assert_eq!(
        classify_rpc_error(&rpc(4001, "whatever", None)),
        WalletError::UserRejected
    );
    assert_eq!(
        classify_rpc_error(&rpc(-32000, "MetaMask Tx Signature: User denied transaction signature.", None)),
        WalletError::UserRejected
    );
}

#[test]
fn unrecognized_chain_is_found_inside_wrapped_internal_error() {
    let wrapped = rpc(
        INTERNAL_ERROR_CODE,
        "Internal JSON-RPC error.",
        Some(json!({ "originalError": { "code": 4902, "message": "Unrecognized chain ID" } })),
    );
    assert_eq!(classify_rpc_error(&wrapped), WalletError::UnrecognizedChain);
    assert_eq!(
        classify_rpc_error(&rpc(4902, "Unrecognized chain ID \"0xa869\".", None)),
        WalletError::UnrecognizedChain
    );
}

#[test]
fn revert_reason_prefers_decoded_error_string() {
    let err = rpc(
        EXECUTION_REVERTED_CODE,
        "execution reverted",
        Some(json!(revert_data("value too large"))),
    );
    assert_eq!(
        classify_rpc_error(&err),
        WalletError::Reverted {
            reason: "value too large".to_string()
        }
    );
}

#[test]
fn revert_reason_falls_back_to_message_suffix() {
    let err = rpc(-32000, "execution reverted: not owner", None);
    assert_eq!(
        classify_rpc_error(&err),
        WalletError::Reverted {
            reason: "not owner".to_string()
        }
    );
}

#[test]
fn unknown_errors_keep_code_and_message() {
    let err = rpc(-32000, "insufficient funds for gas * price + value", None);
    assert_eq!(
        classify_rpc_error(&err),
        WalletError::Rpc {
            code: -32000,
            message: "insufficient funds for gas * price + value".to_string()
        }
    );
    assert_eq!(
        classify_rpc_error(&RpcError::Status(503)),
        WalletError::Transport("http status 503".to_string())
    );
}

#[test]
fn failure_reason_uses_best_available_message() {
    assert_eq!(
        failure_reason(&WalletError::Rpc {
            code: -32000,
            message: " nonce too low ".to_string()
        }),
        "nonce too low"
    );
    assert_eq!(
        failure_reason(&WalletError::Rpc {
            code: -32000,
            message: String::new()
        }),
        DEFAULT_FAILURE_REASON
    );
    assert_eq!(
        failure_reason(&WalletError::Malformed("bad hash".to_string())),
        DEFAULT_FAILURE_REASON
    );
    assert_eq!(
        failure_reason(&WalletError::Reverted {
            reason: "not owner".to_string()
        }),
        "Execution reverted: not owner"
    );
}
