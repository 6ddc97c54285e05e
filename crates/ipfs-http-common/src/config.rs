//! Client configuration and per-call options.

use std::time::Duration;

use bon::Builder;
use http::{HeaderName, HeaderValue};
use multiaddr::Multiaddr;
use url::Url;

use crate::endpoint::{AddressError, api_base_url, parse_multiaddr};
use crate::multipart::DEFAULT_CHUNK_SIZE;

/// Environment variable overriding the default daemon address.
pub const ENV_DEFAULT_ADDR: &str = "IPFS_HTTP_CLIENT_DEFAULT_ADDR";
/// Environment variable overriding the default API base path.
pub const ENV_DEFAULT_BASE: &str = "IPFS_HTTP_CLIENT_DEFAULT_BASE";

/// Default daemon API address.
pub const DEFAULT_ADDR: &str = "/dns/localhost/tcp/5001/http";
/// Default API base path.
pub const DEFAULT_BASE: &str = "api/v0";

fn default_addr() -> Multiaddr {
    DEFAULT_ADDR
        .parse()
        .expect("default API address should be a valid multiaddr")
}

/// Configuration used to construct a client.
///
/// Built once (usually at startup) and handed to the client by value.
///
/// ```
/// use ipfs_http_common::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .addr("/ip4/127.0.0.1/tcp/5001".parse().unwrap())
///     .chunk_size(64 * 1024)
///     .build();
/// assert_eq!(config.base, "api/v0");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Daemon API address
    #[builder(default = default_addr())]
    pub addr: Multiaddr,
    /// API base path appended to the address
    #[builder(default = DEFAULT_BASE.to_owned(), into)]
    pub base: String,
    /// Size of the pieces file content is read and sent in
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Options applied to every call unless overridden per call
    #[builder(default)]
    pub defaults: CallOptions,
    /// Open a pooled session right away
    #[builder(default)]
    pub session: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Default configuration with the address and base path taken from
    /// `IPFS_HTTP_CLIENT_DEFAULT_ADDR` / `IPFS_HTTP_CLIENT_DEFAULT_BASE` when set.
    pub fn from_env() -> Result<Self, AddressError> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var(ENV_DEFAULT_ADDR) {
            config.addr = parse_multiaddr(&addr)?;
        }
        if let Ok(base) = std::env::var(ENV_DEFAULT_BASE) {
            config.base = base;
        }
        Ok(config)
    }

    /// The URL API method paths are joined onto.
    pub fn base_url(&self) -> Result<Url, AddressError> {
        api_base_url(&self.addr, &self.base)
    }
}

/// HTTP basic auth credentials, for daemons behind an authenticating proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Optional password
    pub password: Option<String>,
}

impl BasicAuth {
    /// Credentials with a password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub(crate) fn header_value(&self) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        use base64::Engine;
        let raw = format!(
            "{}:{}",
            self.username,
            self.password.as_deref().unwrap_or_default()
        );
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        HeaderValue::from_str(&format!("Basic {encoded}"))
    }
}

/// Per-request options for daemon calls.
#[derive(Debug, Default, Clone, Builder)]
pub struct CallOptions {
    /// Deadline for the whole request, including reading a buffered body.
    ///
    /// For streamed responses it covers everything up to the first body
    /// byte, and after that bounds the wait for each further chunk.
    pub timeout: Option<Duration>,
    /// Extra headers to attach to this request.
    #[builder(default)]
    pub headers: Vec<(HeaderName, HeaderValue)>,
    /// Basic auth credentials.
    pub auth: Option<BasicAuth>,
    /// Ask the daemon not to touch the network for this call.
    pub offline: Option<bool>,
    /// The caller does not need the response body of unit-returning calls.
    pub discard_result: Option<bool>,
}

impl CallOptions {
    /// Add an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Whether calls run in offline mode. Unset means no.
    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    /// Whether unit-returning calls may skip the response body. Unset means no.
    pub fn discards_result(&self) -> bool {
        self.discard_result.unwrap_or(false)
    }

    /// Overlay these options on top of `defaults`.
    ///
    /// Scalars set here win, including an explicit `false`; headers from
    /// `defaults` come first.
    pub fn merged_over(&self, defaults: &CallOptions) -> CallOptions {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers.iter().cloned());
        CallOptions {
            timeout: self.timeout.or(defaults.timeout),
            headers,
            auth: self.auth.clone().or_else(|| defaults.auth.clone()),
            offline: self.offline.or(defaults.offline),
            discard_result: self.discard_result.or(defaults.discard_result),
        }
    }
}
