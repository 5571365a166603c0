use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use chain_rpc::{JsonRpcClient, StorageContract};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    spawn_wallet_watcher, status, ChainValueSource, DappEvent, DappSession,
    FixedDelayConfirmation, JsonRpcWalletProvider, MissingWalletProvider, ProxyValueSource,
    SessionHandle, SessionSnapshot, TxStatus, UserCommand, ValueSource, WalletProvider,
    DEFAULT_CONFIRMATION_DELAY, DEFAULT_WALLET_POLL_INTERVAL,
};
use shared::domain::TargetNetwork;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(about = "Read and write the simple-storage contract value")]
struct Args {
    /// Backend that serves GET /blockchain/value.
    #[arg(long, env = "DAPP_BACKEND_URL", default_value = "http://127.0.0.1:3000")]
    backend_url: String,
    /// JSON-RPC endpoint holding the wallet accounts. Without it no wallet is available.
    #[arg(long, env = "WALLET_RPC_URL")]
    wallet_rpc_url: Option<Url>,
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: Option<Address>,
    #[arg(long, value_enum, default_value_t = ReadFrom::Proxy)]
    read_from: ReadFrom,
    /// Node used for direct contract reads with `--read-from chain`.
    #[arg(long, env = "RPC_URL", default_value = "https://api.avax-test.network/ext/bc/C/rpc")]
    chain_rpc_url: Url,
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_DELAY.as_millis() as u64)]
    confirmation_delay_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReadFrom {
    Proxy,
    Chain,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the stored value.
    Value,
    /// Connect the wallet and print connection, balance and value.
    Status,
    /// Submit setValue(VALUE) and wait for the presumed confirmation.
    Set { value: String },
    /// Ask the wallet to move to the target network.
    Switch,
    /// Follow wallet changes and print session events until Ctrl-C.
    Watch {
        #[arg(long, default_value_t = DEFAULT_WALLET_POLL_INTERVAL.as_millis() as u64)]
        poll_interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();
    let target = TargetNetwork::avalanche_fuji();

    let provider: Arc<dyn WalletProvider> = match &args.wallet_rpc_url {
        Some(url) => Arc::new(JsonRpcWalletProvider::new(url.clone())),
        None => Arc::new(MissingWalletProvider),
    };
    let source = value_source(&args)?;
    let contract_address = match (&args.command, args.contract_address) {
        (_, Some(address)) => address,
        (Command::Set { .. }, None) => bail!("--contract-address is required to submit a value"),
        (_, None) => Address::ZERO,
    };

    let (session, handle) = DappSession::new_with_dependencies(
        target.clone(),
        contract_address,
        provider.clone(),
        source,
        Arc::new(FixedDelayConfirmation::new(Duration::from_millis(
            args.confirmation_delay_ms,
        ))),
    );
    let mut events = handle.subscribe();
    let session_task = tokio::spawn(session.run());
    debug!(command = ?args.command, "session started");

    let outcome = match &args.command {
        Command::Value | Command::Status | Command::Switch => {
            let commands = match &args.command {
                Command::Status => vec![UserCommand::Connect],
                Command::Switch => vec![UserCommand::Connect, UserCommand::SwitchToTarget],
                _ => Vec::new(),
            };
            for command in commands {
                handle.send(command)?;
            }
            Ok(())
        }
        Command::Set { value } => submit(&handle, &mut events, &target, value).await,
        Command::Watch { poll_interval_ms } => {
            watch(
                provider,
                &handle,
                &mut events,
                &target,
                Duration::from_millis(*poll_interval_ms),
            )
            .await
        }
    };

    handle.send(UserCommand::Shutdown)?;
    let snapshot = session_task.await.context("dapp session task failed")?;
    drain_notices(&mut events);
    outcome?;

    match args.command {
        Command::Value => {
            println!("{}", status::value_label(&snapshot.value));
            if snapshot.value.raw.is_none() {
                bail!("could not read the stored value");
            }
        }
        _ => print_summary(&snapshot, &target),
    }
    Ok(())
}

fn value_source(args: &Args) -> Result<Arc<dyn ValueSource>> {
    Ok(match args.read_from {
        ReadFrom::Proxy => Arc::new(ProxyValueSource::new(&args.backend_url)),
        ReadFrom::Chain => {
            let address = args
                .contract_address
                .context("--contract-address is required with --read-from chain")?;
            let rpc = JsonRpcClient::new(args.chain_rpc_url.clone());
            Arc::new(ChainValueSource::new(StorageContract::new(rpc, address)))
        }
    })
}

async fn submit(
    handle: &SessionHandle,
    events: &mut broadcast::Receiver<DappEvent>,
    target: &TargetNetwork,
    value: &str,
) -> Result<()> {
    handle.send(UserCommand::Connect)?;
    handle.send(UserCommand::SubmitValue(value.to_string()))?;

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "event stream lagged");
                continue;
            }
            Err(RecvError::Closed) => bail!("session ended before the write finished"),
        };
        if let Some(line) = describe(&event, target) {
            println!("{line}");
        }
        match event {
            DappEvent::WriteChanged(write) => match write.tx_status {
                TxStatus::Succeeded(_) => return Ok(()),
                TxStatus::Failed(reason) => bail!("write failed: {reason}"),
                _ => {}
            },
            DappEvent::Notice(message) => bail!("write not submitted: {message}"),
            _ => {}
        }
    }
}

async fn watch(
    provider: Arc<dyn WalletProvider>,
    handle: &SessionHandle,
    events: &mut broadcast::Receiver<DappEvent>,
    target: &TargetNetwork,
    interval: Duration,
) -> Result<()> {
    handle.send(UserCommand::Connect)?;
    let watcher = spawn_wallet_watcher(provider, handle.clone(), interval);
    info!(interval_ms = interval.as_millis() as u64, "watching wallet");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = describe(&event, target) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    watcher.abort();
    Ok(())
}

fn drain_notices(events: &mut broadcast::Receiver<DappEvent>) {
    while let Ok(event) = events.try_recv() {
        if let DappEvent::Notice(message) = event {
            println!("{message}");
        }
    }
}

fn describe(event: &DappEvent, target: &TargetNetwork) -> Option<String> {
    match event {
        DappEvent::ConnectionChanged(state) => Some(format!(
            "wallet: {} [{}]",
            status::status_line(state.status),
            status::network_label(state, target)
        )),
        DappEvent::BalanceChanged(balance) => Some(format!(
            "balance: {}",
            status::balance_label(*balance, target)
        )),
        DappEvent::ValueChanged(value) => Some(format!("value: {}", status::value_label(value))),
        DappEvent::WriteChanged(write) => status::write_status_line(write),
        DappEvent::Notice(message) => Some(message.clone()),
    }
}

fn print_summary(snapshot: &SessionSnapshot, target: &TargetNetwork) {
    let connection = &snapshot.connection;
    println!("status:  {}", status::status_line(connection.status));
    if let Some(address) = &connection.address {
        println!("account: {address}");
    }
    println!("network: {}", status::network_label(connection, target));
    println!(
        "balance: {}",
        status::balance_label(snapshot.balance, target)
    );
    println!("value:   {}", status::value_label(&snapshot.value));
    println!(
        "next:    {}",
        status::action_label(status::primary_action(connection), target)
    );
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
