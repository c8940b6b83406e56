use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::RpcError;

/// Stream of raw text frames pushed by the node on a persistent connection.
///
/// An `Err` item reports that the connection broke; the stream ends after it.
pub type InboundFrames = mpsc::UnboundedReceiver<Result<String, RpcError>>;

/// How the reply to a sent frame will arrive.
#[derive(Debug)]
pub enum Delivery {
    /// Request/response transport: the reply body is returned directly.
    Reply(String),
    /// The reply will arrive later on the connection's [`InboundFrames`].
    Pending,
}

/// Byte-level connection to a node.
///
/// Implementations own the socket or connection pool, attach credentials and
/// never retry. Replies are correlated by the caller, not the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit one encoded request envelope.
    async fn send(&self, frame: String) -> Result<Delivery, RpcError>;

    /// Release the connection. Must be idempotent.
    async fn close(&self);
}

/// An opened transport plus, for persistent connections, its inbound frames.
pub struct Opened {
    pub transport: Box<dyn Transport>,
    pub inbound: Option<InboundFrames>,
}
