pub mod confirmation;
pub mod connection;
pub mod error;
pub mod events;
pub mod provider;
pub mod session;
pub mod status;
pub mod value;
pub mod watch;

pub use confirmation::{ConfirmationStrategy, FixedDelayConfirmation, DEFAULT_CONFIRMATION_DELAY};
pub use connection::{
    ConnectionController, ConnectionState, ConnectionStatus, Reconciliation, SwitchOutcome,
};
pub use error::{FetchError, SubmitError, SubmitRejection, WalletError};
pub use events::{DappEvent, WalletEvent};
pub use provider::{JsonRpcWalletProvider, MissingWalletProvider, WalletProvider};
pub use session::{DappSession, SessionClosed, SessionHandle, SessionSnapshot, UserCommand};
pub use value::{
    ChainValueSource, FetchStatus, PendingWrite, ProxyValueSource, StoredValue, TxStatus,
    ValueSource, ValueSynchronizer,
};
pub use watch::{spawn_wallet_watcher, DEFAULT_WALLET_POLL_INTERVAL};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
