use std::time::Duration;

use alloy_primitives::TxHash;
use async_trait::async_trait;
use tracing::debug;

use crate::error::WalletError;

pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_millis(2000);

#[async_trait]
pub trait ConfirmationStrategy: Send + Sync {
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), WalletError>;
}

/// Waits a fixed delay and assumes the transaction landed. It never looks at
/// a receipt, so a reverted or still-pending transaction is reported as
/// confirmed once the delay passes.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayConfirmation {
    delay: Duration,
}

impl FixedDelayConfirmation {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelayConfirmation {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_DELAY)
    }
}

#[async_trait]
impl ConfirmationStrategy for FixedDelayConfirmation {
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), WalletError> {
        debug!(%tx_hash, delay_ms = self.delay.as_millis() as u64, "waiting before refresh");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
