//! Daemon client with optional pooled sessions.
//!
//! A [`Client`] owns a [`Connector`] and, while a session is open, one pooled
//! transport produced by it. Calls made while the session is open share its
//! connection pool; calls made without one get a fresh one-shot transport
//! that is dropped, together with its connection, when the call returns.

mod call;
mod content;
mod node;
mod session;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use http::{Method, StatusCode};
use ipfs_http_common::error::{ClientError, Result, TransportError};
use ipfs_http_common::http_client::{ByteStream, ConnectMode, Connector, HttpClient, HttpClientExt};
use ipfs_http_common::request::{
    ApiRequest, build_http_request, check_status, collect_body, error_from_body,
};
use ipfs_http_common::version::{Version, VersionRange};
use ipfs_http_common::{CallOptions, ClientConfig};
use url::Url;

pub use call::Call;
pub use content::{AddOptions, AddedObject, LsLink, LsObject};
pub use node::{PeerIdentity, PingReply, VersionInfo};
pub use session::SessionGuard;

#[cfg(feature = "reqwest-client")]
use ipfs_http_common::http_client::ReqwestConnector;

/// Client using the bundled `reqwest` transport.
#[cfg(feature = "reqwest-client")]
pub type BasicClient = Client<ReqwestConnector>;

/// Stateful client for the daemon HTTP API.
///
/// Without an open session each call opens its own connection. Open a
/// session to share one connection pool between consecutive calls:
///
/// ```no_run
/// # async fn demo() -> ipfs_http_client::Result<()> {
/// let client = ipfs_http_client::connect(Default::default()).await?;
/// println!("{}", client.version().await?.version); // own connection
/// {
///     let session = client.session()?;
///     session.id(None).await?; // these two calls…
///     session.id(None).await?; // …share a connection
/// } // session released here
/// # Ok(())
/// # }
/// ```
pub struct Client<C: Connector> {
    connector: C,
    base: Url,
    chunk_size: usize,
    defaults: CallOptions,
    session: Mutex<Option<Arc<C::Client>>>,
    head_for_no_result: bool,
}

impl<C: Connector> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.base.as_str())
            .field("chunk_size", &self.chunk_size)
            .field("session", &self.has_session())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "reqwest-client")]
impl Client<ReqwestConnector> {
    /// Create a client without checking the daemon version.
    ///
    /// Prefer [`crate::connect`], which refuses unsupported daemons.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_connector(ReqwestConnector::default(), config)
    }
}

impl<C: Connector> Client<C> {
    /// Create a client on top of a custom connector, without a version check.
    pub fn with_connector(connector: C, config: ClientConfig) -> Result<Self> {
        let base = config.base_url()?;
        let client = Self {
            connector,
            base,
            chunk_size: config.chunk_size,
            defaults: config.defaults,
            session: Mutex::new(None),
            head_for_no_result: false,
        };
        if config.session {
            client.open_session()?;
        }
        Ok(client)
    }

    /// Base URL every method path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Chunk size used for uploads.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Options applied to every call.
    pub fn defaults(&self) -> &CallOptions {
        &self.defaults
    }

    /// Replace the options applied to every call.
    pub fn set_defaults(&mut self, defaults: CallOptions) {
        self.defaults = defaults;
    }

    /// Access the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Arc<C::Client>>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a session is currently open.
    pub fn has_session(&self) -> bool {
        self.session_slot().is_some()
    }

    /// Open a pooled session. Does nothing if one is already open.
    pub fn open_session(&self) -> Result<()> {
        let mut slot = self.session_slot();
        if slot.is_none() {
            *slot = Some(Arc::new(self.connector.connect(ConnectMode::Pooled)?));
            #[cfg(feature = "tracing")]
            tracing::debug!(base = %self.base, "opened session");
        }
        Ok(())
    }

    /// Close the open session, if any, releasing its pooled connections.
    ///
    /// Calls keep working afterwards, each on its own connection.
    pub fn close(&self) {
        if self.session_slot().take().is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(base = %self.base, "closed session");
        }
    }

    /// Open a session for the lifetime of the returned guard.
    ///
    /// The session is closed when the guard is dropped, however the scope
    /// is left.
    pub fn session(&self) -> Result<SessionGuard<'_, C>> {
        self.open_session()?;
        Ok(SessionGuard::new(self))
    }

    /// Start a call with the client's default options.
    pub fn call(&self, request: ApiRequest) -> Call<'_, C> {
        Call::new(self, request, self.defaults.clone())
    }

    fn transport(&self) -> Result<Arc<C::Client>> {
        if let Some(transport) = self.session_slot().as_ref() {
            return Ok(transport.clone());
        }
        Ok(Arc::new(self.connector.connect(ConnectMode::OneShot)?))
    }

    fn method_for(&self, request: &ApiRequest, opts: &CallOptions) -> Method {
        if self.head_for_no_result && opts.discards_result() && request.body().is_none() {
            Method::HEAD
        } else {
            Method::POST
        }
    }

    /// Send `request`, streaming its multipart body if it has one.
    async fn exchange(
        &self,
        transport: &C::Client,
        request: &ApiRequest,
        opts: &CallOptions,
        method: Method,
    ) -> Result<http::Response<ByteStream>> {
        let http_request = build_http_request(&self.base, request, opts, method)?;
        let response = match request.body() {
            Some(body) => {
                let (parts, ()) = http_request.into_parts();
                transport
                    .send_http_bidirectional(parts, body.stream())
                    .await
            }
            None => {
                transport
                    .send_http_streaming(http_request.map(|()| Vec::new()))
                    .await
            }
        };
        response.map_err(transport_error)
    }

    async fn fetch(
        &self,
        request: &ApiRequest,
        opts: &CallOptions,
        method: Method,
    ) -> Result<(StatusCode, Bytes)> {
        let transport = self.transport()?;
        if request.body().is_none() {
            let http_request = build_http_request(&self.base, request, opts, method)?;
            let response = transport
                .send_http(http_request.map(|()| Vec::new()))
                .await
                .map_err(transport_error)?;
            return Ok((response.status(), Bytes::from(response.into_body())));
        }
        let response = self.exchange(&transport, request, opts, method).await?;
        let status = response.status();
        Ok((status, collect_body(response.into_body()).await?))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, request, opts), fields(path = request.path())))]
    pub(crate) async fn send_buffered(
        &self,
        request: &ApiRequest,
        opts: &CallOptions,
        method: Method,
    ) -> Result<Bytes> {
        let (status, body) = deadline(opts.timeout, self.fetch(request, opts, method)).await??;
        let result = check_status(status, body);
        #[cfg(feature = "tracing")]
        if let Err(e) = &result {
            tracing::debug!(error = %e, "daemon call failed");
        }
        result
    }

    async fn open_stream(&self, request: &ApiRequest, opts: &CallOptions) -> Result<ByteStream> {
        let transport = self.transport()?;
        let response = self
            .exchange(&transport, request, opts, Method::POST)
            .await?;
        let status = response.status();
        let body = response.into_body();
        if status.is_success() {
            return Ok(body);
        }
        let buffer = collect_body(body).await?;
        Err(error_from_body(status, buffer))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, request, opts), fields(path = request.path())))]
    pub(crate) async fn send_streaming(
        &self,
        request: &ApiRequest,
        opts: &CallOptions,
    ) -> Result<ByteStream> {
        let body = deadline(opts.timeout, self.open_stream(request, opts)).await??;
        Ok(match opts.timeout {
            Some(limit) => idle_timeout(body, limit),
            None => body,
        })
    }

    pub(crate) fn apply_version_workarounds(&mut self, version: &Version) {
        if version.components() < [0, 5].as_slice() {
            #[cfg(feature = "tracing")]
            tracing::debug!(%version, "daemon predates 0.5, using HEAD for result-less calls");
            self.head_for_no_result = true;
        }
    }
}

fn transport_error<E: Into<TransportError>>(e: E) -> ClientError {
    ClientError::from(e.into())
}

async fn deadline<F: Future>(timeout: Option<Duration>, fut: F) -> Result<F::Output> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ClientError::Timeout),
        None => Ok(fut.await),
    }
}

/// End `body` with a timeout error once no chunk arrives within `limit`.
fn idle_timeout(body: ByteStream, limit: Duration) -> ByteStream {
    Box::pin(futures::stream::unfold(Some(body), move |body| async move {
        let Some(mut body) = body else {
            return None;
        };
        match tokio::time::timeout(limit, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(_) => Some((Err(TransportError::Timeout), None)),
        }
    }))
}

/// Construct a client and refuse daemons outside `range`.
///
/// The daemon is asked for its version straight away; if that call fails or
/// the version is unsupported no client is returned.
pub async fn connect_with<C: Connector>(
    connector: C,
    config: ClientConfig,
    range: &VersionRange,
) -> Result<Client<C>> {
    let mut client = Client::with_connector(connector, config)?;
    let info = client.version().await?;
    let version = match range.check(&info.version) {
        Ok(version) => version,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(reported = %info.version, "refusing unsupported daemon");
            return Err(e);
        }
    };
    client.apply_version_workarounds(&version);
    Ok(client)
}

/// Connect to the daemon described by `config` using the `reqwest` transport
/// and the built-in supported version range.
#[cfg(feature = "reqwest-client")]
pub async fn connect(config: ClientConfig) -> Result<BasicClient> {
    connect_with(ReqwestConnector::default(), config, &VersionRange::default()).await
}
