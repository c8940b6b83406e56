use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use tracing::{debug, trace};

use crate::config::{ClientConfig, Credentials};
use crate::error::RpcError;

use super::transport::{Delivery, Opened, Transport};

/// JSON-RPC over HTTP(S) POST.
///
/// Connectionless from the caller's point of view: `reqwest` keeps a pool of
/// keep-alive connections, and every call is one POST whose body is the reply.
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    url: String,
    auth: Option<Credentials>,
    closed: AtomicBool,
}

impl HttpTransport {
    /// Build the pooled HTTP client. No request is sent; an unreachable node
    /// is reported by the first call.
    pub(crate) fn open(config: &ClientConfig) -> Result<Opened, RpcError> {
        // The per-call deadline is enforced by the correlator; only the TCP
        // connect step gets its own bound here.
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RpcError::Connection(format!("build HTTP client: {e}")))?;

        debug!(url = %config.endpoint_url(), "http transport ready");
        Ok(Opened {
            transport: Box::new(Self {
                client,
                url: config.endpoint_url(),
                auth: config.credentials().cloned(),
                closed: AtomicBool::new(false),
            }),
            inbound: None,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, frame: String) -> Result<Delivery, RpcError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::closed());
        }

        let mut builder = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(frame);
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.password));
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RpcError::Connection(format!(
                "authentication rejected by {} ({status})",
                self.url
            )));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!(%status, body_len = body.len(), "http response");
        trace!(body = %body, "http response body");

        Ok(Delivery::Reply(body))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(url = %self.url, "http transport closed");
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RpcError {
    if err.is_connect() {
        RpcError::Connection(err.to_string())
    } else {
        RpcError::Transport(err.to_string())
    }
}
