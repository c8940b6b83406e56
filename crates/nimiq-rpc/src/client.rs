use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rpc::correlator::Correlator;
use crate::rpc::{HttpTransport, Params, WsTransport};
use crate::subscription::{Decode, Subscription};
use crate::types::{RpcResult, StateData};

/// Async JSON-RPC client for one Nimiq node.
///
/// Cloning is cheap; clones share one connection and may issue calls
/// concurrently. The connection is released by [`NimiqClient::close`] or
/// when the last clone is dropped, whichever comes first.
#[derive(Clone)]
pub struct NimiqClient {
    config: Arc<ClientConfig>,
    correlator: Arc<Correlator>,
}

impl NimiqClient {
    /// Validate `config` and open the connection.
    ///
    /// For `ws`/`wss` this performs the WebSocket handshake. For `http`/`https`
    /// no request is sent; an unreachable node is reported by the first call.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let opened = if config.scheme().is_websocket() {
            WsTransport::open(&config).await?
        } else {
            HttpTransport::open(&config)?
        };
        let correlator = Correlator::start(opened, config.timeout());
        debug!(url = %config.endpoint_url(), "nimiq client connected");

        Ok(Self {
            config: Arc::new(config),
            correlator: Arc::new(correlator),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_transport(config: ClientConfig, opened: crate::rpc::Opened) -> Self {
        let correlator = Correlator::start(opened, config.timeout());
        Self {
            config: Arc::new(config),
            correlator: Arc::new(correlator),
        }
    }

    /// Close the connection. Pending calls on any clone fail with a transport
    /// error, as does every later call. Safe to call more than once.
    pub async fn close(&self) {
        self.correlator.close().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of calls awaiting a reply across all clones.
    pub fn pending_calls(&self) -> usize {
        self.correlator.pending_calls()
    }

    /// Call `method` and decode its raw `result` into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Into<Params>,
    ) -> Result<T, ClientError> {
        let value = self.call_raw(method, params).await?;
        decode_result(method, value)
    }

    /// Call `method` and return its `result` untouched.
    pub async fn call_raw(
        &self,
        method: &str,
        params: impl Into<Params>,
    ) -> Result<Value, ClientError> {
        Ok(self.correlator.call(method, params.into()).await?)
    }

    // ==========================================================================
    // Result Unwrapping
    // ==========================================================================

    /// The `data` part of a wrapped result.
    pub(crate) async fn call_data<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ClientError> {
        let result: RpcResult<T> = self.call(method, params).await?;
        Ok(result.data)
    }

    /// Like [`call_data`](Self::call_data), but a `null` result or `null`
    /// data means "not found".
    pub(crate) async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>, ClientError> {
        let result: Option<RpcResult<Option<T>>> = self.call(method, params).await?;
        Ok(result.and_then(|result| result.data))
    }

    /// Like [`call_data`](Self::call_data), but a `null` result or `null`
    /// data is an empty list.
    pub(crate) async fn call_list<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Vec<T>, ClientError> {
        Ok(self
            .call_optional::<Vec<T>>(method, params)
            .await?
            .unwrap_or_default())
    }

    /// Data plus the blockchain state it was read at.
    pub(crate) async fn call_state<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<StateData<T>, ClientError> {
        self.call(method, params).await
    }

    // ==========================================================================
    // Subscriptions
    // ==========================================================================

    pub(crate) async fn subscribe<T>(
        &self,
        method: &str,
        params: Vec<Value>,
        decode: Decode<T>,
    ) -> Result<Subscription<T>, ClientError> {
        if !self.correlator.is_persistent() {
            return Err(ClientError::Unsupported(format!(
                "`{method}` needs a websocket connection, not {}",
                self.config.scheme()
            )));
        }

        let (sink, notifications) = mpsc::unbounded_channel();
        let id = self
            .correlator
            .subscribe(method, params.into(), sink)
            .await?;
        debug!(subscription = id, method, "subscribed");

        Ok(Subscription::new(
            id,
            method,
            notifications,
            decode,
            Arc::downgrade(&self.correlator),
        ))
    }
}

impl fmt::Debug for NimiqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NimiqClient")
            .field("url", &self.config.endpoint_url())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

pub(crate) fn decode_result<T: DeserializeOwned>(
    method: &str,
    value: Value,
) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::InvalidResult {
        method: method.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::Scheme;
    use crate::error::RpcError;

    #[tokio::test]
    async fn connect_rejects_invalid_config() {
        let err = NimiqClient::connect(ClientConfig::default().with_host(""))
            .await
            .expect_err("empty host must be rejected");
        assert!(matches!(err, ClientError::Config(_)));

        let err = NimiqClient::connect(ClientConfig::default().with_timeout(Duration::ZERO))
            .await
            .expect_err("zero timeout must be rejected");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn http_connect_is_lazy_and_first_call_reports_unreachable_node() {
        // Port 9 (discard) is closed on loopback in test environments.
        let config = ClientConfig::new(Scheme::Http, "127.0.0.1", 9)
            .with_timeout(Duration::from_secs(2));
        let client = NimiqClient::connect(config).await.expect("no probe on open");

        let err = client
            .call_raw("getBlockNumber", ())
            .await
            .expect_err("nothing listens there");
        assert!(
            matches!(err.rpc(), Some(RpcError::Connection(_) | RpcError::Timeout { .. })),
            "got {err:?}"
        );
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn subscribe_over_http_is_unsupported() {
        let client = NimiqClient::connect(ClientConfig::default())
            .await
            .expect("http connect is lazy");
        let err = client
            .subscribe_for_head_block_hash()
            .await
            .expect_err("http cannot carry notifications");
        assert!(matches!(err, ClientError::Unsupported(_)));
    }

    #[test]
    fn decode_result_mismatch_names_method() {
        let err = decode_result::<u32>("getBlockNumber", json!("twelve")).expect_err("mismatch");
        match err {
            ClientError::InvalidResult { method, .. } => assert_eq!(method, "getBlockNumber"),
            other => panic!("expected invalid result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_then_call_fails_with_transport_error() {
        let client = NimiqClient::connect(ClientConfig::default())
            .await
            .expect("http connect is lazy");
        client.close().await;
        client.close().await;
        let err = client.call_raw("getBlockNumber", ()).await.expect_err("closed");
        assert!(matches!(err.rpc(), Some(RpcError::Transport(_))));
    }
}
