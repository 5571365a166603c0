//! JSON-RPC plumbing and ABI helpers for the simple-storage contract.

pub mod abi;
pub mod contract;
pub mod rpc;
pub mod units;

pub use contract::{set_value_transaction, CallRequest, StorageContract, TransactionRequest};
pub use rpc::{JsonRpcClient, RpcError};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
