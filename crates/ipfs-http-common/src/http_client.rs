//! Minimal HTTP client abstraction.
//!
//! [`HttpClient`] and [`HttpClientExt`] are the seam between the request core
//! and whatever actually moves bytes. [`Connector`] hands out transports,
//! either pooled (kept for the lifetime of a session) or one-shot (dropped
//! together with their connection after a single call).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
#[cfg(feature = "reqwest-client")]
use std::time::Duration;

#[cfg(feature = "reqwest-client")]
use bon::Builder;
use bytes::Bytes;
use futures::Stream;

use crate::error::TransportError;
use crate::request::EncodeError;

/// Streamed response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP client trait for sending raw HTTP requests.
#[trait_variant::make(Send)]
pub trait HttpClient {
    /// Error type returned by the HTTP client
    type Error: std::error::Error + Into<TransportError> + Send + Sync + 'static;

    /// Send an HTTP request and return the fully buffered response.
    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>>;
}

/// Extension trait for HTTP clients that can stream request and response bodies.
#[trait_variant::make(Send)]
pub trait HttpClientExt: HttpClient {
    /// Send an HTTP request and return a response whose body is read lazily.
    fn send_http_streaming(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = Result<http::Response<ByteStream>, Self::Error>>;

    /// Send an HTTP request whose body is pulled from `body` while it is
    /// being sent, and return a response whose body is read lazily.
    fn send_http_bidirectional<S>(
        &self,
        parts: http::request::Parts,
        body: S,
    ) -> impl Future<Output = Result<http::Response<ByteStream>, Self::Error>>
    where
        S: Stream<Item = Result<Bytes, EncodeError>> + Send + 'static;
}

impl<T: HttpClient + Sync> HttpClient for Arc<T> {
    type Error = T::Error;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl Future<Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>> + Send
    {
        self.as_ref().send_http(request)
    }
}

/// How long a transport handed out by a [`Connector`] is going to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectMode {
    /// Kept open across calls; idle connections are pooled and reused.
    Pooled,
    /// Used for a single call; connections are not kept around.
    OneShot,
}

/// Factory for transports.
pub trait Connector: Send + Sync {
    /// Transport type produced by this connector
    type Client: HttpClientExt + Send + Sync + 'static;

    /// Open a transport in the given mode.
    fn connect(&self, mode: ConnectMode) -> Result<Self::Client, TransportError>;
}

#[cfg(feature = "reqwest-client")]
impl HttpClient for reqwest::Client {
    type Error = reqwest::Error;

    async fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> core::result::Result<http::Response<Vec<u8>>, Self::Error> {
        let (parts, body) = request.into_parts();

        let resp = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

#[cfg(feature = "reqwest-client")]
impl HttpClientExt for reqwest::Client {
    async fn send_http_streaming(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<ByteStream>, Self::Error> {
        let (parts, body) = request.into_parts();

        let resp = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;
        Ok(streaming_response(resp))
    }

    async fn send_http_bidirectional<S>(
        &self,
        parts: http::request::Parts,
        body: S,
    ) -> Result<http::Response<ByteStream>, Self::Error>
    where
        S: Stream<Item = Result<Bytes, EncodeError>> + Send + 'static,
    {
        let resp = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;
        Ok(streaming_response(resp))
    }
}

#[cfg(feature = "reqwest-client")]
fn streaming_response(resp: reqwest::Response) -> http::Response<ByteStream> {
    use futures::StreamExt;

    let status = resp.status();
    let headers = resp.headers().clone();
    let stream: ByteStream =
        Box::pin(resp.bytes_stream().map(|chunk| chunk.map_err(TransportError::from)));

    let mut response = http::Response::new(stream);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Default `User-Agent` sent by [`ReqwestConnector`].
pub const DEFAULT_USER_AGENT: &str = concat!("ipfs-http/", env!("CARGO_PKG_VERSION"));

/// [`Connector`] producing `reqwest` clients.
#[cfg(feature = "reqwest-client")]
#[derive(Debug, Clone, Default, Builder)]
pub struct ReqwestConnector {
    /// Overrides [`DEFAULT_USER_AGENT`]
    #[builder(into)]
    pub user_agent: Option<String>,
    /// Deadline for establishing a TCP connection
    pub connect_timeout: Option<Duration>,
}

#[cfg(feature = "reqwest-client")]
impl Connector for ReqwestConnector {
    type Client = reqwest::Client;

    fn connect(&self, mode: ConnectMode) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if mode == ConnectMode::OneShot {
            builder = builder.pool_max_idle_per_host(0);
        }
        Ok(builder.build()?)
    }
}
