use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use shared::domain::ChainId;
use tokio::net::TcpListener;

use super::*;
use crate::{
    connection::ConnectionStatus,
    error::DEFAULT_FAILURE_REASON,
    test_support::{tx_hash, FakeSource, FakeWallet, WalletCall, ALICE, CONTRACT, FUJI},
};

async fn spawn_backend(status: StatusCode, body: Value) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        VALUE_ROUTE,
        get(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/")
}

fn connected() -> ConnectionState {
    ConnectionState {
        status: ConnectionStatus::Connected,
        address: Some(ALICE),
        chain_id: Some(FUJI),
    }
}

fn synchronizer(
    source: Arc<dyn ValueSource>,
    wallet: &Arc<FakeWallet>,
) -> (ValueSynchronizer, broadcast::Receiver<DappEvent>) {
    let (events, rx) = broadcast::channel(64);
    (
        ValueSynchronizer::new(source, wallet.clone(), CONTRACT, events),
        rx,
    )
}

fn write_events(rx: &mut broadcast::Receiver<DappEvent>) -> Vec<TxStatus> {
    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DappEvent::WriteChanged(write) = event {
            statuses.push(write.tx_status);
        }
    }
    statuses
}

#[tokio::test]
async fn proxy_value_is_parsed_as_ready() {
    let backend = spawn_backend(StatusCode::OK, json!({ "value": "42" })).await;
    let wallet = Arc::new(FakeWallet::on_fuji());
    let (mut sync, _rx) = synchronizer(Arc::new(ProxyValueSource::new(&backend)), &wallet);

    let value = sync.fetch_value().await.expect("fetch");

    assert_eq!(value, U256::from(42u64));
    assert_eq!(
        sync.value(),
        &StoredValue {
            raw: Some(U256::from(42u64)),
            fetch_status: FetchStatus::Ready,
        }
    );
}

#[tokio::test]
async fn proxy_server_error_fails_and_clears_value() {
    let backend = spawn_backend(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "code": "internal", "message": "boom" }),
    )
    .await;
    let wallet = Arc::new(FakeWallet::on_fuji());
    let (mut sync, _rx) = synchronizer(Arc::new(ProxyValueSource::new(&backend)), &wallet);

    let err = sync.fetch_value().await.expect_err("500");

    assert!(matches!(err, FetchError::Status(500)), "unexpected error: {err}");
    assert_eq!(
        sync.value(),
        &StoredValue {
            raw: None,
            fetch_status: FetchStatus::Failed,
        }
    );
}

#[tokio::test]
async fn proxy_malformed_bodies_are_rejected() {
    for body in [json!({ "value": "-1" }), json!({ "value": 42 }), json!({})] {
        let backend = spawn_backend(StatusCode::OK, body).await;
        let source = ProxyValueSource::new(&backend);

        let err = source.read_value().await.expect_err("malformed");

        assert!(matches!(err, FetchError::Malformed(_)), "unexpected error: {err}");
    }
}

#[tokio::test]
async fn failed_refresh_drops_previous_value() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let source = Arc::new(FakeSource::serving(5));
    let (mut sync, _rx) = synchronizer(source.clone(), &wallet);
    sync.fetch_value().await.expect("first read");

    *source.value.lock().unwrap() = None;
    assert!(sync.fetch_value().await.is_err());

    assert_eq!(sync.value().raw, None);
    assert_eq!(sync.value().fetch_status, FetchStatus::Failed);
}

#[tokio::test]
async fn submit_while_not_connected_never_reaches_wallet() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let (mut sync, mut rx) = synchronizer(Arc::new(FakeSource::serving(0)), &wallet);

    for status in [
        ConnectionStatus::WrongNetwork,
        ConnectionStatus::WrongAccount,
    ] {
        let state = ConnectionState {
            status,
            address: Some(ALICE),
            chain_id: Some(ChainId(1)),
        };
        let err = sync.submit_value("7", &state).await.expect_err("rejected");
        assert_eq!(
            err,
            SubmitError::Rejected(SubmitRejection::NotUsable(status))
        );
    }
    let err = sync
        .submit_value("7", &ConnectionState::default())
        .await
        .expect_err("rejected");
    assert!(matches!(err, SubmitError::Rejected(_)));

    assert!(wallet.calls().is_empty());
    assert_eq!(sync.write(), &PendingWrite::default());
    assert!(write_events(&mut rx).is_empty());
}

#[tokio::test]
async fn submit_rejects_non_integer_input() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let (mut sync, _rx) = synchronizer(Arc::new(FakeSource::serving(0)), &wallet);

    for input in ["", "abc", "-3", "1.5", "1e3", "0x10"] {
        let err = sync
            .submit_value(input, &connected())
            .await
            .expect_err("invalid input");
        assert!(
            matches!(err, SubmitError::Rejected(SubmitRejection::InvalidInput(_))),
            "{input:?} gave {err:?}"
        );
    }
    assert!(wallet.calls().is_empty());
}

#[tokio::test]
async fn submit_sends_set_value_and_awaits_confirmation() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let (mut sync, mut rx) = synchronizer(Arc::new(FakeSource::serving(0)), &wallet);

    let hash = sync.submit_value("7", &connected()).await.expect("submit");

    assert_eq!(hash, tx_hash(0x77));
    assert_eq!(
        wallet.calls(),
        vec![WalletCall::SendTransaction(chain_rpc::set_value_transaction(
            ALICE,
            CONTRACT,
            U256::from(7u64)
        ))]
    );
    assert_eq!(
        write_events(&mut rx),
        vec![
            TxStatus::Submitting,
            TxStatus::AwaitingConfirmation(tx_hash(0x77))
        ]
    );
    assert_eq!(sync.write().input, "7");
}

#[tokio::test]
async fn wallet_failure_becomes_failed_with_reason() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    FakeWallet::set(&wallet.send_result, Err(WalletError::UserRejected));
    let (mut sync, _rx) = synchronizer(Arc::new(FakeSource::serving(0)), &wallet);

    let err = sync.submit_value("7", &connected()).await.expect_err("rejected");

    assert_eq!(err, SubmitError::Wallet(WalletError::UserRejected));
    assert_eq!(
        sync.write().tx_status,
        TxStatus::Failed("User rejected the request.".to_string())
    );

    FakeWallet::set(
        &wallet.send_result,
        Err(WalletError::Rpc {
            code: -32000,
            message: String::new(),
        }),
    );
    let _ = sync.submit_value("8", &connected()).await;
    assert_eq!(
        sync.write().tx_status,
        TxStatus::Failed(DEFAULT_FAILURE_REASON.to_string())
    );
}

#[tokio::test]
async fn confirmation_refreshes_value_and_clears_input() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let source = Arc::new(FakeSource::serving(0));
    let (mut sync, _rx) = synchronizer(source.clone(), &wallet);
    let hash = sync.submit_value("7", &connected()).await.expect("submit");
    *source.value.lock().unwrap() = Some(U256::from(7u64));

    sync.complete_confirmation(hash, Ok(())).await;

    assert_eq!(source.reads(), 1);
    assert_eq!(sync.value().raw, Some(U256::from(7u64)));
    assert_eq!(
        sync.write(),
        &PendingWrite {
            input: String::new(),
            tx_status: TxStatus::Succeeded(hash),
        }
    );
}

#[tokio::test]
async fn failed_refresh_after_confirmation_marks_write_failed() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let source = Arc::new(FakeSource::failing());
    let (mut sync, _rx) = synchronizer(source, &wallet);
    let hash = sync.submit_value("7", &connected()).await.expect("submit");

    sync.complete_confirmation(hash, Ok(())).await;

    match &sync.write().tx_status {
        TxStatus::Failed(reason) => assert!(
            reason.starts_with("value refresh failed:"),
            "unexpected reason: {reason}"
        ),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(sync.write().input, "7");
}

#[tokio::test]
async fn stale_confirmation_is_ignored() {
    let wallet = Arc::new(FakeWallet::on_fuji());
    let source = Arc::new(FakeSource::serving(0));
    let (mut sync, _rx) = synchronizer(source.clone(), &wallet);
    sync.submit_value("7", &connected()).await.expect("submit");

    sync.complete_confirmation(tx_hash(0x01), Ok(())).await;

    assert_eq!(source.reads(), 0);
    assert_eq!(
        sync.write().tx_status,
        TxStatus::AwaitingConfirmation(tx_hash(0x77))
    );
}

#[test]
fn check_submission_is_shared_with_ui_gating() {
    assert_eq!(check_submission("12", &connected()), Ok(U256::from(12u64)));
    assert_eq!(
        check_submission("12", &ConnectionState::default()),
        Err(SubmitRejection::NotUsable(ConnectionStatus::Disconnected))
    );
}
