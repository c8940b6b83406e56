use std::fmt;
use std::time::Duration;

// ==============================================================================
// Node Error
// ==============================================================================

/// Error object reported by the node in a JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(serde_json::Value::String(data)) => {
                write!(f, "{}: {} ({})", self.message, data, self.code)
            }
            Some(data) => write!(f, "{}: {} ({})", self.message, data, self.code),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

// ==============================================================================
// RPC Error
// ==============================================================================

/// Failure of a single RPC exchange.
///
/// Each variant is one fault class. Callers branch on the variant (or on
/// [`RpcError::is_retryable`]) rather than on message text.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    /// Endpoint unreachable, authentication rejected or handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response arrived within the configured deadline.
    #[error("`{method}` timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    /// The connection broke or was closed while the call was in flight.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The node sent a response envelope that cannot be decoded.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The node rejected or could not service the request.
    #[error("node error: {0}")]
    Remote(NodeError),

    /// The request could not be framed (empty method, unserializable params).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RpcError {
    /// Whether the caller may reasonably retry the same call.
    ///
    /// Only timeouts and broken connections qualify; connection setup
    /// failures, malformed responses and node-reported errors do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }

    /// The node error, if this failure was reported by the node.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn closed() -> Self {
        Self::Transport("connection closed".to_owned())
    }
}

impl From<NodeError> for RpcError {
    fn from(err: NodeError) -> Self {
        Self::Remote(err)
    }
}

// ==============================================================================
// Client Error
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The call succeeded but its result does not match the expected model.
    #[error("invalid `{method}` result: {message}")]
    InvalidResult { method: String, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl ClientError {
    /// The underlying RPC failure, if any.
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.rpc().is_some_and(RpcError::is_retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(RpcError::closed().is_retryable());
        assert!(RpcError::Timeout {
            method: "getBlockNumber".into(),
            after: Duration::from_secs(5),
        }
        .is_retryable());
        assert!(!RpcError::Connection("refused".into()).is_retryable());
        assert!(!RpcError::Protocol("bad".into()).is_retryable());
        assert!(!RpcError::Remote(NodeError {
            code: -32601,
            message: "method not found".into(),
            data: None,
        })
        .is_retryable());
    }

    #[test]
    fn node_error_display_includes_data() {
        let err = NodeError {
            code: -32602,
            message: "Invalid params".into(),
            data: Some(serde_json::json!("expected address")),
        };
        assert_eq!(err.to_string(), "Invalid params: expected address (-32602)");
    }

    #[test]
    fn client_error_exposes_rpc_kind() {
        let err = ClientError::from(RpcError::closed());
        assert!(matches!(err.rpc(), Some(RpcError::Transport(_))));
        assert!(err.is_retryable());
        assert!(!ClientError::Config("bad".into()).is_retryable());
    }
}
