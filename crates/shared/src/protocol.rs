use serde::{Deserialize, Serialize};

pub const VALUE_ROUTE: &str = "/blockchain/value";
pub const HEALTH_ROUTE: &str = "/healthz";

/// Body of `GET /blockchain/value`: the stored value as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: String,
}
