//! JSON-RPC dispatch engine.
//!
//! [`protocol`] frames and parses envelopes, the transports move frames
//! between the client and the node, and the correlator matches replies to
//! pending calls by id.

pub(crate) mod correlator;
mod http;
#[cfg(test)]
pub mod mock;
pub mod protocol;
pub mod transport;
mod ws;

pub(crate) use http::HttpTransport;
pub(crate) use ws::WsTransport;

pub use protocol::{
    decode_envelope, decode_request, CallRequest, Envelope, Notification, Params, JSONRPC_VERSION,
};
pub use transport::{Delivery, InboundFrames, Opened, Transport};
