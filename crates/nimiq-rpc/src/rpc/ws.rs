use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::error::RpcError;

use super::transport::{Delivery, Opened, Transport};

/// How long `close` waits for the close frame to be flushed.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// JSON-RPC over a single persistent WebSocket.
///
/// Outgoing frames are queued to a writer task; a reader task forwards every
/// text frame to the inbound channel consumed by the correlator.
pub(crate) struct WsTransport {
    url: String,
    outbound: mpsc::UnboundedSender<Message>,
    writer: Mutex<Option<JoinHandle<()>>>,
    reader: JoinHandle<()>,
    closed: AtomicBool,
}

impl WsTransport {
    /// Perform the WebSocket handshake, attaching basic auth if configured.
    pub(crate) async fn open(config: &ClientConfig) -> Result<Opened, RpcError> {
        let url = config.endpoint_url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RpcError::Connection(format!("invalid websocket endpoint {url}: {e}")))?;
        if let Some(auth) = config.credentials() {
            let token = BASE64_STANDARD.encode(format!("{}:{}", auth.user, auth.password));
            let value = HeaderValue::from_str(&format!("Basic {token}"))
                .map_err(|e| RpcError::Connection(format!("invalid credentials: {e}")))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let (stream, response) =
            tokio::time::timeout(config.timeout(), tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| {
                    RpcError::Connection(format!("websocket handshake with {url} timed out"))
                })?
                .map_err(map_handshake_error)?;
        debug!(%url, status = %response.status(), "websocket connected");

        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer_failures = inbound_tx.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "websocket write failed");
                    let _ = writer_failures.send(Err(RpcError::Transport(format!(
                        "websocket write failed: {e}"
                    ))));
                    return;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(item) = source.next().await {
                let frame = match item {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!("dropping non-UTF-8 binary websocket frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "websocket closed by node");
                        let _ = inbound_tx.send(Err(RpcError::Transport(
                            "websocket closed by node".to_owned(),
                        )));
                        return;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = inbound_tx.send(Err(RpcError::Transport(format!(
                            "websocket read failed: {e}"
                        ))));
                        return;
                    }
                };
                trace!(frame_len = frame.len(), "websocket frame");
                if inbound_tx.send(Ok(frame)).is_err() {
                    return;
                }
            }
            let _ = inbound_tx.send(Err(RpcError::Transport("websocket stream ended".to_owned())));
        });

        Ok(Opened {
            transport: Box::new(Self {
                url,
                outbound,
                writer: Mutex::new(Some(writer)),
                reader,
                closed: AtomicBool::new(false),
            }),
            inbound: Some(inbound),
        })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, frame: String) -> Result<Delivery, RpcError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::closed());
        }
        self.outbound
            .send(Message::Text(frame))
            .map_err(|_| RpcError::Transport("websocket writer stopped".to_owned()))?;
        Ok(Delivery::Pending)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.outbound.send(Message::Close(None));
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(writer) = writer {
            if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, writer).await.is_err() {
                warn!(url = %self.url, "websocket close frame not flushed in time");
            }
        }
        self.reader.abort();
        debug!(url = %self.url, "websocket transport closed");
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
        if let Some(writer) = self
            .writer
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            writer.abort();
        }
    }
}

fn map_handshake_error(err: WsError) -> RpcError {
    match err {
        WsError::Http(response) => RpcError::Connection(format!(
            "websocket handshake rejected ({})",
            response.status()
        )),
        other => RpcError::Connection(format!("websocket connect failed: {other}")),
    }
}
