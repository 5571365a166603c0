use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use chain_rpc::{JsonRpcClient, RpcError, StorageContract};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ValueResponse, HEALTH_ROUTE, VALUE_ROUTE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, parse_contract_address, parse_rpc_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let rpc_url = parse_rpc_url(&settings.rpc_url)?;
    let contract_address = parse_contract_address(settings.contract_address.as_deref())?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.rpc_timeout_seconds))
        .build()
        .context("failed to build rpc http client")?;

    let state = AppState {
        contract: StorageContract::new(
            JsonRpcClient::with_client(http, rpc_url.clone()),
            contract_address,
        ),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, %rpc_url, contract = %contract_address, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    // Browser front ends are served from other origins; reflect whichever one asks.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET]);

    Router::new()
        .route(HEALTH_ROUTE, get(healthz))
        .route(VALUE_ROUTE, get(blockchain_value))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn blockchain_value(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ValueResponse>, (StatusCode, Json<ApiError>)> {
    let value = read_stored_value(&state)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, Json(e)))?;
    Ok(Json(value))
}

async fn read_stored_value(state: &AppState) -> Result<ValueResponse, ApiError> {
    match state.contract.get_value().await {
        Ok(value) => Ok(ValueResponse {
            value: value.to_string(),
        }),
        Err(error) => {
            error!(
                contract = %state.contract.address(),
                endpoint = %state.contract.endpoint(),
                %error,
                "failed to read stored value from chain"
            );
            let code = match &error {
                RpcError::Malformed(_) => ErrorCode::MalformedUpstream,
                _ => ErrorCode::Upstream,
            };
            Err(ApiError::new(code, error.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
