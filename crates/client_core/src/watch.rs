use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use shared::domain::ChainId;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, warn};

use crate::{events::WalletEvent, provider::WalletProvider, session::SessionHandle};

pub const DEFAULT_WALLET_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Turns a polling-only wallet into an event source. The first successful
/// poll only records a baseline; later differences are posted to the session
/// as `AccountsChanged` / `ChainChanged`. Stops once the session is gone.
pub fn spawn_wallet_watcher(
    provider: Arc<dyn WalletProvider>,
    handle: SessionHandle,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_accounts: Option<Vec<Address>> = None;
        let mut last_chain: Option<ChainId> = None;

        loop {
            ticker.tick().await;
            if handle.is_closed() {
                return;
            }

            match provider.accounts().await {
                Ok(accounts) => {
                    let changed = last_accounts
                        .as_ref()
                        .is_some_and(|previous| previous != &accounts);
                    last_accounts = Some(accounts.clone());
                    if changed {
                        debug!(count = accounts.len(), "wallet accounts changed");
                        if handle
                            .wallet_event(WalletEvent::AccountsChanged(accounts))
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                Err(err) => warn!(%err, "wallet accounts poll failed"),
            }

            match provider.chain_id().await {
                Ok(chain_id) => {
                    let changed = last_chain.is_some_and(|previous| previous != chain_id);
                    last_chain = Some(chain_id);
                    if changed {
                        debug!(%chain_id, "wallet chain changed");
                        if handle
                            .wallet_event(WalletEvent::ChainChanged(chain_id))
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                Err(err) => warn!(%err, "wallet chain poll failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/watch_tests.rs"]
mod tests;
