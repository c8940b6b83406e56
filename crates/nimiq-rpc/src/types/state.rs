use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The chain head a piece of state was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainState {
    pub block_number: u32,
    pub block_hash: String,
}

/// The `{"data", "metadata"}` wrapper every Nimiq RPC result comes in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResult<T, M = Value> {
    pub data: T,
    #[serde(default = "Option::default")]
    pub metadata: Option<M>,
}

/// Data that is only valid for the blockchain state it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateData<T> {
    pub data: T,
    pub metadata: BlockchainState,
}

impl<T> StateData<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StateData<U> {
        StateData {
            data: f(self.data),
            metadata: self.metadata,
        }
    }
}
