//! JSON-RPC 2.0 envelope encoding and decoding.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};

use crate::error::{NodeError, RpcError};

pub const JSONRPC_VERSION: &str = "2.0";

/// Longest slice of a raw body quoted in protocol error messages.
const BODY_PREVIEW_LEN: usize = 256;

// ==============================================================================
// Requests
// ==============================================================================

/// Argument list of a call: nothing, positional values, or named values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // The node expects an array even for argument-less methods.
            Self::None => serializer.serialize_seq(Some(0))?.end(),
            Self::Positional(values) => values.serialize(serializer),
            Self::Named(values) => values.serialize(serializer),
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Self::Named(values)
    }
}

/// One outgoing call: method, arguments and the id that correlates its reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub id: u64,
    pub method: String,
    pub params: Params,
}

#[derive(serde::Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Params,
}

impl CallRequest {
    pub fn new(id: u64, method: impl Into<String>, params: impl Into<Params>) -> Self {
        Self {
            id,
            method: method.into(),
            params: params.into(),
        }
    }

    /// Serialize into a JSON-RPC 2.0 request envelope.
    pub fn encode(&self) -> Result<String, RpcError> {
        if self.method.trim().is_empty() {
            return Err(RpcError::InvalidRequest("method must not be empty".to_owned()));
        }
        serde_json::to_string(&JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.id,
            method: &self.method,
            params: &self.params,
        })
        .map_err(|e| RpcError::InvalidRequest(format!("encode `{}` params: {e}", self.method)))
    }
}

/// Parse a request envelope produced by [`CallRequest::encode`].
pub fn decode_request(text: &str) -> Result<CallRequest, RpcError> {
    let mut obj = parse_object(text)?;
    let id = parse_call_id(obj.get("id").unwrap_or(&Value::Null))?;
    let method = match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(RpcError::Protocol("request without method".to_owned())),
    };
    let params = match obj.remove("params") {
        None | Some(Value::Null) => Params::None,
        Some(Value::Array(values)) if values.is_empty() => Params::None,
        Some(Value::Array(values)) => Params::Positional(values),
        Some(Value::Object(values)) => Params::Named(values),
        Some(other) => {
            return Err(RpcError::Protocol(format!(
                "request params must be an array or object, got {other}"
            )))
        }
    };
    Ok(CallRequest { id, method, params })
}

// ==============================================================================
// Responses
// ==============================================================================

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Reply to a call. A node-reported error is a successfully decoded reply.
    Reply {
        id: u64,
        outcome: Result<Value, NodeError>,
    },
    /// Server-initiated message for an active subscription.
    Notification(Notification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub subscription: u64,
    pub result: Value,
}

/// Decode one response or notification envelope.
///
/// Fails with [`RpcError::Protocol`] if the text is not a JSON object, a reply
/// lacks a usable `id`, or a reply carries both or neither of `result` and
/// `error`.
pub fn decode_envelope(text: &str) -> Result<Envelope, RpcError> {
    let mut obj = parse_object(text)?;

    if !obj.contains_key("id") && obj.contains_key("method") {
        return decode_notification(obj).map(Envelope::Notification);
    }

    let id = match obj.get("id") {
        Some(id) => parse_call_id(id)?,
        None => {
            return Err(RpcError::Protocol(format!(
                "response without id: {}",
                preview(text)
            )))
        }
    };

    let result = obj.remove("result");
    let error = obj.remove("error").filter(|e| !e.is_null());
    let outcome = match (result, error) {
        (Some(_), Some(_)) => {
            return Err(RpcError::Protocol(format!(
                "response id={id} carries both result and error"
            )))
        }
        (None, Some(err)) => Err(parse_jsonrpc_error(err)?),
        (Some(result), None) => Ok(result),
        (None, None) => {
            return Err(RpcError::Protocol(format!(
                "response id={id} carries neither result nor error"
            )))
        }
    };

    Ok(Envelope::Reply { id, outcome })
}

fn decode_notification(mut obj: Map<String, Value>) -> Result<Notification, RpcError> {
    let method = match obj.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(RpcError::Protocol("notification method must be a string".to_owned())),
    };
    let Some(Value::Object(mut params)) = obj.remove("params") else {
        return Err(RpcError::Protocol(format!(
            "notification `{method}` without params object"
        )));
    };
    let subscription = params
        .get("subscription")
        .ok_or_else(|| {
            RpcError::Protocol(format!("notification `{method}` without subscription id"))
        })
        .and_then(parse_call_id)?;
    let result = params.remove("result").unwrap_or(Value::Null);

    Ok(Notification {
        method,
        subscription,
        result,
    })
}

/// Parse a JSON-RPC error value into a [`NodeError`].
///
/// JSON-RPC 2.0 defines errors as `{"code": <int>, "message": <string>}`
/// with optional `data`. Anything else is a protocol violation.
pub(crate) fn parse_jsonrpc_error(err: Value) -> Result<NodeError, RpcError> {
    serde_json::from_value::<NodeError>(err.clone())
        .map_err(|_| RpcError::Protocol(format!("non-standard JSON-RPC error: {err}")))
}

/// Call ids are numbers, but some nodes echo them back as numeric strings.
pub(crate) fn parse_call_id(id: &Value) -> Result<u64, RpcError> {
    if let Some(n) = id.as_u64() {
        return Ok(n);
    }

    if let Some(s) = id.as_str() {
        return s
            .parse::<u64>()
            .map_err(|e| RpcError::Protocol(format!("invalid call id string: {e}")));
    }

    Err(RpcError::Protocol(format!("invalid call id: {id}")))
}

fn parse_object(text: &str) -> Result<Map<String, Value>, RpcError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(other) => Err(RpcError::Protocol(format!(
            "expected JSON object, got {}",
            preview(&other.to_string())
        ))),
        Err(e) => Err(RpcError::Protocol(format!(
            "invalid JSON: {e}; body={}",
            preview(text)
        ))),
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
