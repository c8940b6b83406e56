//! Server-push streams opened by `subscribeFor*` calls.

use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ClientError;
use crate::rpc::correlator::Correlator;

/// Turns one notification `result` into the subscription's item type.
pub(crate) type Decode<T> = fn(Value) -> Result<T, serde_json::Error>;

/// Notifications of one active subscription, decoded into `T`.
///
/// Ends when the connection closes. Dropping it stops local delivery; the
/// node keeps sending until the connection closes, and those frames are
/// discarded.
pub struct Subscription<T> {
    id: u64,
    method: String,
    notifications: mpsc::UnboundedReceiver<Value>,
    decode: Decode<T>,
    correlator: Weak<Correlator>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        id: u64,
        method: &str,
        notifications: mpsc::UnboundedReceiver<Value>,
        decode: Decode<T>,
        correlator: Weak<Correlator>,
    ) -> Self {
        Self {
            id,
            method: method.to_owned(),
            notifications,
            decode,
            correlator,
        }
    }

    /// The node-assigned subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Wait for the next notification. `None` once the connection is closed.
    pub async fn next(&mut self) -> Option<Result<T, ClientError>> {
        let value = self.notifications.recv().await?;
        Some(self.decode_item(value))
    }

    fn decode_item(&self, value: Value) -> Result<T, ClientError> {
        (self.decode)(value).map_err(|e| ClientError::InvalidResult {
            method: self.method.clone(),
            message: e.to_string(),
        })
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.notifications
            .poll_recv(cx)
            .map(|item| item.map(|value| this.decode_item(value)))
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(correlator) = self.correlator.upgrade() {
            correlator.unsubscribe(self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
