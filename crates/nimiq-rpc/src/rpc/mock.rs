//! In-process transports for unit tests.
//!
//! [`duplex`] behaves like a WebSocket: sent frames are handed to a
//! [`MockNode`] that answers whenever and in whatever order the test wants.
//! [`responder`] behaves like HTTP: each frame is answered inline by a closure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::error::RpcError;

use super::protocol::{decode_request, CallRequest};
use super::transport::{Delivery, Opened, Transport};

// ==============================================================================
// Duplex
// ==============================================================================

struct DuplexTransport {
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for DuplexTransport {
    async fn send(&self, frame: String) -> Result<Delivery, RpcError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::closed());
        }
        self.outbound
            .send(frame)
            .map_err(|_| RpcError::Transport("mock node gone".to_owned()))?;
        Ok(Delivery::Pending)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// The far end of a [`duplex`] connection.
pub struct MockNode {
    requests: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<Result<String, RpcError>>,
    closed: Arc<AtomicBool>,
}

impl MockNode {
    /// Wait for the next request the client sends.
    pub async fn next_request(&mut self) -> CallRequest {
        let frame = self
            .requests
            .recv()
            .await
            .expect("client dropped the connection");
        decode_request(&frame).expect("client sent an invalid request")
    }

    pub fn reply(&self, id: u64, result: Value) {
        self.push(&json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string());
    }

    pub fn reply_error(&self, id: u64, code: i64, message: &str, data: Option<Value>) {
        let mut error = json!({"code": code, "message": message});
        if let Some(data) = data {
            error["data"] = data;
        }
        self.push(&json!({"jsonrpc": "2.0", "id": id, "error": error}).to_string());
    }

    pub fn notify(&self, method: &str, subscription: u64, result: Value) {
        self.push(
            &json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": {"subscription": subscription, "result": result},
            })
            .to_string(),
        );
    }

    /// Deliver a raw frame as if the node had sent it.
    pub fn push(&self, frame: &str) {
        let _ = self.inbound.send(Ok(frame.to_owned()));
    }

    /// Simulate the connection breaking.
    pub fn fail(&self, err: RpcError) {
        let _ = self.inbound.send(Err(err));
    }

    pub fn transport_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

pub fn duplex() -> (Opened, MockNode) {
    let (outbound, requests) = mpsc::unbounded_channel();
    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    let opened = Opened {
        transport: Box::new(DuplexTransport {
            outbound,
            closed: Arc::clone(&closed),
        }),
        inbound: Some(inbound),
    };
    let node = MockNode {
        requests,
        inbound: inbound_tx,
        closed,
    };
    (opened, node)
}

// ==============================================================================
// Responder
// ==============================================================================

type Respond = dyn Fn(&CallRequest) -> Result<String, RpcError> + Send + Sync;

struct ResponderTransport {
    respond: Box<Respond>,
}

#[async_trait]
impl Transport for ResponderTransport {
    async fn send(&self, frame: String) -> Result<Delivery, RpcError> {
        let request = decode_request(&frame)?;
        (self.respond)(&request).map(Delivery::Reply)
    }

    async fn close(&self) {}
}

/// A request/response transport answering each call with `respond`'s body.
pub fn responder<F>(respond: F) -> Opened
where
    F: Fn(&CallRequest) -> Result<String, RpcError> + Send + Sync + 'static,
{
    Opened {
        transport: Box::new(ResponderTransport {
            respond: Box::new(respond),
        }),
        inbound: None,
    }
}
