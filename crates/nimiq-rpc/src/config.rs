//! Endpoint configuration for [`NimiqClient`](crate::NimiqClient).
//!
//! Defaults mirror a stock Nimiq node: plain HTTP on `127.0.0.1:8648`, no
//! authentication. The configuration is an explicit value handed to the
//! client at construction time; nothing is read from ambient state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8648;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path the node serves its WebSocket RPC endpoint on.
const WS_PATH: &str = "/ws";

// ==============================================================================
// Scheme
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
    Ws,
    Wss,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }

    /// Whether this scheme uses a persistent WebSocket connection.
    pub fn is_websocket(self) -> bool {
        matches!(self, Self::Ws | Self::Wss)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "ws" => Ok(Self::Ws),
            "wss" => Ok(Self::Wss),
            other => Err(ClientError::Config(format!(
                "unsupported scheme `{other}`; expected http, https, ws or wss"
            ))),
        }
    }
}

// ==============================================================================
// Credentials
// ==============================================================================

/// HTTP basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolve optional user/password flags into credentials.
///
/// Both must be given together; giving neither means no authentication.
pub fn resolve_auth(
    user: Option<&str>,
    password: Option<&str>,
) -> Result<Option<Credentials>, ClientError> {
    match (user, password) {
        (Some(u), Some(p)) => Ok(Some(Credentials::new(u, p))),
        (Some(_), None) | (None, Some(_)) => Err(ClientError::Config(
            "both rpc user and rpc password must be set together".to_owned(),
        )),
        (None, None) => Ok(None),
    }
}

// ==============================================================================
// Client Configuration
// ==============================================================================

#[derive(Debug, Clone)]
pub struct ClientConfig {
    scheme: Scheme,
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Build a configuration from an endpoint URL such as
    /// `ws://127.0.0.1:8648`. Only scheme, host and port are taken from the
    /// URL; a missing port falls back to the scheme's well-known port.
    pub fn from_url(
        connection: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ClientError> {
        let parsed = Url::parse(connection).map_err(|e| {
            ClientError::Config(format!(
                "invalid connection `{connection}`: expected http(s) or ws(s) URL ({e})"
            ))
        })?;
        let scheme: Scheme = parsed.scheme().parse()?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ClientError::Config(format!("connection `{connection}` has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_owned();
        let port = parsed.port_or_known_default().unwrap_or(DEFAULT_PORT);

        Ok(Self {
            scheme,
            host,
            port,
            credentials: resolve_auth(user, password)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Deadline applied to every call, measured from submission to reply.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL the transport connects to. WebSocket endpoints live under `/ws`.
    pub fn endpoint_url(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let path = if self.scheme.is_websocket() { WS_PATH } else { "" };
        format!("{}://{}:{}{}", self.scheme, host, self.port, path)
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Config("host must not be empty".to_owned()));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be non-zero".to_owned()));
        }
        if let Some(credentials) = &self.credentials {
            if credentials.user.is_empty() {
                return Err(ClientError::Config(
                    "rpc user must not be empty when credentials are set".to_owned(),
                ));
            }
        }
        Url::parse(&self.endpoint_url())
            .map(|_| ())
            .map_err(|e| ClientError::Config(format!("invalid endpoint: {e}")))
    }
}
