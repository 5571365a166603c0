use chain_rpc::StorageContract;

pub(crate) struct AppState {
    pub(crate) contract: StorageContract,
}
