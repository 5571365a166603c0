use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc endpoint returned http status {0}")]
    Status(u16),
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

impl RpcError {
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Transport(err) if err.is_timeout())
    }
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

pub struct JsonRpcClient {
    http: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// A `null` result is handed to `R` as JSON null, so `R = ()` works for
    /// methods such as `wallet_switchEthereumChain`.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, endpoint = %self.endpoint, "json-rpc request");

        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let body: RpcResponse = res
            .json()
            .await
            .map_err(|err| RpcError::Malformed(format!("{method}: {err}")))?;
        if let Some(err) = body.error {
            debug!(method, id, code = err.code, message = %err.message, "json-rpc error");
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null))
            .map_err(|err| RpcError::Malformed(format!("{method}: {err}")))
    }
}
