//! Request/response correlation over one shared connection.
//!
//! Every call gets a fresh id and a pending slot (a `oneshot` sender) in the
//! call table before its frame is sent. Replies are matched to slots purely by
//! id, so any number of calls may be in flight and may complete in any order.
//!
//! ```text
//! caller ──► reserve id ──► register slot ──► transport.send(frame)
//!                                                 │
//!                  HTTP: Delivery::Reply(body) ───┤
//!         WebSocket: reader task ◄── inbound ─────┘
//!                                   │
//!                       decode ──► route by id ──► slot resolves ──► caller
//! ```
//!
//! The table is the only shared mutable state and is always accessed under
//! its mutex. A dropped caller removes only its own slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{NodeError, RpcError};

use super::protocol::{decode_envelope, parse_call_id, CallRequest, Envelope, Params};
use super::transport::{Delivery, InboundFrames, Opened, Transport};

/// Receives the `result` payload of every notification for one subscription.
pub(crate) type NotificationSink = mpsc::UnboundedSender<Value>;

type ReplySender = oneshot::Sender<Result<Value, RpcError>>;

struct PendingCall {
    method: String,
    reply: ReplySender,
    /// Set for subscribe calls: registered under the returned subscription id
    /// as soon as the reply is routed.
    subscription: Option<NotificationSink>,
}

#[derive(Default)]
struct CallTable {
    pending: HashMap<u64, PendingCall>,
    subscriptions: HashMap<u64, NotificationSink>,
    closed: bool,
}

impl CallTable {
    /// Resolve every pending call with `err`. With `shutdown`, also refuse
    /// new calls and end all subscription streams.
    fn fail_all(&mut self, err: &RpcError, shutdown: bool) {
        for (id, call) in self.pending.drain() {
            debug!(rpc.id = id, rpc.method = %call.method, error = %err, "pending call failed");
            let _ = call.reply.send(Err(err.clone()));
        }
        if shutdown {
            self.closed = true;
            self.subscriptions.clear();
        }
    }
}

fn lock(table: &Mutex<CallTable>) -> MutexGuard<'_, CallTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a call's slot when its caller stops waiting, whatever the reason.
struct PendingGuard<'a> {
    table: &'a Mutex<CallTable>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.table).pending.remove(&self.id);
    }
}

// ==============================================================================
// Correlator
// ==============================================================================

pub(crate) struct Correlator {
    transport: Box<dyn Transport>,
    table: Arc<Mutex<CallTable>>,
    next_id: AtomicU64,
    timeout: Duration,
    reader: Mutex<Option<JoinHandle<()>>>,
    persistent: bool,
    shut_down: AtomicBool,
}

impl Correlator {
    /// Take ownership of an opened transport. For persistent connections a
    /// reader task is spawned on the current runtime to route inbound frames.
    pub(crate) fn start(opened: Opened, timeout: Duration) -> Self {
        let table = Arc::new(Mutex::new(CallTable::default()));
        let persistent = opened.inbound.is_some();
        let reader = opened
            .inbound
            .map(|inbound| tokio::spawn(read_loop(Arc::clone(&table), inbound)));

        Self {
            transport: opened.transport,
            table,
            next_id: AtomicU64::new(1),
            timeout,
            reader: Mutex::new(reader),
            persistent,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Whether replies arrive on a persistent stream that can also carry
    /// subscription notifications.
    pub(crate) fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn reserve_call_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) async fn call(&self, method: &str, params: Params) -> Result<Value, RpcError> {
        self.dispatch(method, params, None).await
    }

    /// Issue a subscribe call and register `sink` for its notifications.
    /// Returns the node-assigned subscription id.
    pub(crate) async fn subscribe(
        &self,
        method: &str,
        params: Params,
        sink: NotificationSink,
    ) -> Result<u64, RpcError> {
        let result = self.dispatch(method, params, Some(sink)).await?;
        parse_call_id(&result)
    }

    pub(crate) fn unsubscribe(&self, subscription: u64) {
        if lock(&self.table).subscriptions.remove(&subscription).is_some() {
            debug!(subscription, "subscription released");
        }
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Params,
        subscription: Option<NotificationSink>,
    ) -> Result<Value, RpcError> {
        let id = self.reserve_call_id();
        let param_count = params.len();
        let frame = CallRequest::new(id, method, params).encode()?;

        let (reply, mut rx) = oneshot::channel();
        {
            let mut table = lock(&self.table);
            if table.closed {
                return Err(RpcError::closed());
            }
            table.pending.insert(
                id,
                PendingCall {
                    method: method.to_owned(),
                    reply,
                    subscription,
                },
            );
        }
        let _guard = PendingGuard {
            table: &self.table,
            id,
        };
        debug!(rpc.id = id, rpc.method = method, rpc.params = param_count, "rpc call");

        let exchange = async {
            tokio::select! {
                biased;
                // Resolved early by close() or a connection failure.
                outcome = &mut rx => {
                    return outcome.unwrap_or_else(|_| Err(RpcError::closed()));
                }
                sent = self.transport.send(frame) => match sent {
                    Ok(Delivery::Reply(body)) => route_inline_reply(&self.table, &body, id),
                    Ok(Delivery::Pending) => {}
                    Err(err) => return Err(err),
                },
            }
            rx.await.unwrap_or_else(|_| Err(RpcError::closed()))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(result)) => {
                debug!(rpc.id = id, rpc.method = method, "rpc response");
                Ok(result)
            }
            Ok(Err(err)) => {
                debug!(rpc.id = id, rpc.method = method, error = %err, "rpc failed");
                Err(err)
            }
            Err(_) => {
                warn!(rpc.id = id, rpc.method = method, timeout = ?self.timeout, "rpc timed out");
                Err(RpcError::Timeout {
                    method: method.to_owned(),
                    after: self.timeout,
                })
            }
        }
    }

    /// Number of calls currently awaiting a reply.
    pub(crate) fn pending_calls(&self) -> usize {
        lock(&self.table).pending.len()
    }

    /// Fail every pending call with a transport error, stop routing and close
    /// the transport. Safe to call more than once.
    pub(crate) async fn close(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.table).fail_all(&RpcError::closed(), true);
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            reader.abort();
        }
        self.transport.close().await;
        debug!("connection closed");
    }
}

impl Drop for Correlator {
    fn drop(&mut self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.table).fail_all(&RpcError::closed(), true);
        if let Some(reader) = self
            .reader
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            reader.abort();
        }
    }
}

// ==============================================================================
// Inbound Routing
// ==============================================================================

async fn read_loop(table: Arc<Mutex<CallTable>>, mut inbound: InboundFrames) {
    while let Some(frame) = inbound.recv().await {
        match frame {
            Ok(text) => route_frame(&table, &text),
            Err(err) => {
                warn!(error = %err, "connection lost; failing pending calls");
                lock(&table).fail_all(&err, true);
                return;
            }
        }
    }
    lock(&table).fail_all(&RpcError::closed(), true);
}

/// Deliver one frame read from the shared inbound stream.
///
/// An undecodable frame cannot be attributed to any call, so every pending
/// call on the connection fails with a protocol error.
fn route_frame(table: &Mutex<CallTable>, text: &str) {
    let envelope = match decode_envelope(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "unroutable frame; failing pending calls");
            lock(table).fail_all(&err, false);
            return;
        }
    };

    let mut table = lock(table);
    match envelope {
        Envelope::Reply { id, outcome } => match table.pending.remove(&id) {
            Some(call) => settle(&mut table, id, call, outcome),
            None => debug!(rpc.id = id, "reply for unknown or abandoned call dropped"),
        },
        Envelope::Notification(notification) => {
            let subscription = notification.subscription;
            let delivered = table
                .subscriptions
                .get(&subscription)
                .map(|sink| sink.send(notification.result).is_ok());
            match delivered {
                Some(true) => {}
                Some(false) => {
                    table.subscriptions.remove(&subscription);
                    debug!(subscription, "subscriber gone; subscription released");
                }
                None => debug!(
                    subscription,
                    method = %notification.method,
                    "notification for unknown subscription dropped"
                ),
            }
        }
    }
}

/// Deliver a reply body returned inline for call `expected` (HTTP).
///
/// The body answers only the request that produced it: any other slot in the
/// table is left untouched, whatever id the body carries.
fn route_inline_reply(table: &Mutex<CallTable>, text: &str, expected: u64) {
    let outcome = match decode_envelope(text) {
        Ok(Envelope::Reply { id, outcome }) if id == expected => Ok(outcome),
        Ok(Envelope::Reply { id, .. }) => Err(RpcError::Protocol(format!(
            "reply id {id} does not match request id {expected}"
        ))),
        Ok(Envelope::Notification(notification)) => Err(RpcError::Protocol(format!(
            "expected reply to request id {expected}, got `{}` notification",
            notification.method
        ))),
        Err(err) => Err(err),
    };

    let mut table = lock(table);
    let Some(call) = table.pending.remove(&expected) else {
        return;
    };
    match outcome {
        Ok(outcome) => settle(&mut table, expected, call, outcome),
        Err(err) => {
            debug!(rpc.id = expected, error = %err, "inline reply rejected");
            let _ = call.reply.send(Err(err));
        }
    }
}

/// Resolve `call` with its reply. A successful subscribe call registers its
/// sink under the returned subscription id first.
fn settle(
    table: &mut CallTable,
    id: u64,
    call: PendingCall,
    outcome: Result<Value, NodeError>,
) {
    let outcome = match (outcome, call.subscription) {
        (Ok(value), Some(sink)) => parse_call_id(&value).map(|subscription| {
            debug!(rpc.id = id, subscription, "subscription registered");
            table.subscriptions.insert(subscription, sink);
            value
        }),
        (outcome, _) => outcome.map_err(RpcError::Remote),
    };
    let _ = call.reply.send(outcome);
}
