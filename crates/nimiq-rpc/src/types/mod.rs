//! Typed models of Nimiq RPC results.
//!
//! Field names follow the node's camelCase JSON. Unknown fields are ignored so
//! newer node releases keep decoding.

mod account;
mod block;
mod inherent;
mod log;
mod mempool;
mod state;
mod transaction;
mod validator;

pub use account::{Account, AccountKind, AccountType, WalletAccount};
pub use block::{Block, BlockKind, BlockTransactions, BlockType, ForkProof, SlashedSlots, Slot};
pub use inherent::Inherent;
pub use log::{BlockLog, Log, LogType, TransactionLog};
pub use mempool::{MempoolEntry, MempoolInfo};
pub use state::{BlockchainState, RpcResult, StateData};
pub use transaction::{Transaction, ValidityStartHeight};
pub use validator::{ParkedValidators, Staker, Validator};
