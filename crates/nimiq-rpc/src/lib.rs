//! Typed async JSON-RPC client for Nimiq Albatross nodes.
//!
//! [`NimiqClient`] owns one connection (HTTP or WebSocket) and exposes every
//! node method as a typed `async fn`. Calls may run concurrently on a shared
//! client; replies are matched to calls by id.

pub mod client;
pub mod config;
pub mod error;
mod methods;
pub mod rpc;
pub mod subscription;
pub mod types;

#[cfg(test)]
mod test_util;

pub use client::NimiqClient;
pub use config::{ClientConfig, Credentials, Scheme};
pub use error::{ClientError, NodeError, RpcError};
pub use rpc::Params;
pub use subscription::Subscription;
