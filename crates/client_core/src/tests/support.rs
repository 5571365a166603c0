//! In-memory wallet and value source shared by the module tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chain_rpc::TransactionRequest;
use shared::domain::{ChainId, TargetNetwork, AVALANCHE_FUJI_CHAIN_ID};

use crate::{
    error::{FetchError, WalletError},
    provider::WalletProvider,
    value::ValueSource,
};

pub(crate) const ALICE: Address = Address::repeat_byte(0xa1);
pub(crate) const BOB: Address = Address::repeat_byte(0xb0);
pub(crate) const CONTRACT: Address = Address::repeat_byte(0xcc);
pub(crate) const OTHER_CHAIN: ChainId = ChainId(1);
pub(crate) const FUJI: ChainId = AVALANCHE_FUJI_CHAIN_ID;

pub(crate) fn tx_hash(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WalletCall {
    RequestAccounts,
    Accounts,
    ChainId,
    SwitchChain(ChainId),
    AddChain(TargetNetwork),
    Balance(Address),
    SendTransaction(TransactionRequest),
}

pub(crate) struct FakeWallet {
    pub(crate) available: bool,
    pub(crate) accounts: Mutex<Result<Vec<Address>, WalletError>>,
    pub(crate) chain_id: Mutex<Result<ChainId, WalletError>>,
    pub(crate) switch_result: Mutex<Result<(), WalletError>>,
    pub(crate) add_chain_result: Mutex<Result<(), WalletError>>,
    pub(crate) balance: Mutex<Result<U256, WalletError>>,
    pub(crate) send_result: Mutex<Result<TxHash, WalletError>>,
    calls: Mutex<Vec<WalletCall>>,
}

impl FakeWallet {
    pub(crate) fn new(accounts: Vec<Address>, chain_id: ChainId) -> Self {
        Self {
            available: true,
            accounts: Mutex::new(Ok(accounts)),
            chain_id: Mutex::new(Ok(chain_id)),
            switch_result: Mutex::new(Ok(())),
            add_chain_result: Mutex::new(Ok(())),
            balance: Mutex::new(Ok(U256::from(1_500_000_000_000_000_000u128))),
            send_result: Mutex::new(Ok(tx_hash(0x77))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on_fuji() -> Self {
        Self::new(vec![ALICE], FUJI)
    }

    pub(crate) fn unavailable() -> Self {
        let mut wallet = Self::new(Vec::new(), FUJI);
        wallet.available = false;
        wallet
    }

    pub(crate) fn set<T>(slot: &Mutex<T>, value: T) {
        *slot.lock().unwrap() = value;
    }

    pub(crate) fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&WalletCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: WalletCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record(WalletCall::RequestAccounts);
        self.accounts.lock().unwrap().clone()
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record(WalletCall::Accounts);
        self.accounts.lock().unwrap().clone()
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        self.record(WalletCall::ChainId);
        self.chain_id.lock().unwrap().clone()
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.record(WalletCall::SwitchChain(chain_id));
        let result = self.switch_result.lock().unwrap().clone();
        if result.is_ok() {
            Self::set(&self.chain_id, Ok(chain_id));
        }
        result
    }

    async fn add_chain(&self, network: &TargetNetwork) -> Result<(), WalletError> {
        self.record(WalletCall::AddChain(network.clone()));
        self.add_chain_result.lock().unwrap().clone()
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        self.record(WalletCall::Balance(address));
        self.balance.lock().unwrap().clone()
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        self.record(WalletCall::SendTransaction(tx));
        self.send_result.lock().unwrap().clone()
    }
}

/// Serves `value`, or an HTTP 500 style failure when it is `None`.
pub(crate) struct FakeSource {
    pub(crate) value: Mutex<Option<U256>>,
    reads: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn serving(value: u64) -> Self {
        Self {
            value: Mutex::new(Some(U256::from(value))),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            value: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueSource for FakeSource {
    async fn read_value(&self) -> Result<U256, FetchError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = *self.value.lock().unwrap();
        value.ok_or(FetchError::Status(500))
    }
}
