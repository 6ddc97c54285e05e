use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use http::{HeaderName, HeaderValue, Method};
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::{ByteStream, Connector};
use ipfs_http_common::request::{ApiRequest, decode_json_items, decode_single, json_stream};
use ipfs_http_common::{CallOptions, ClientError};
use serde::de::DeserializeOwned;

use super::Client;

/// A single daemon call, with per-call overrides.
///
/// Every typed API method is built on this; it is also the escape hatch for
/// methods the typed API does not cover:
///
/// ```no_run
/// # async fn demo(client: &ipfs_http_client::BasicClient) -> ipfs_http_client::Result<()> {
/// use ipfs_http_client::ApiRequest;
/// use std::time::Duration;
///
/// let stats: serde_json::Value = client
///     .call(ApiRequest::new("stats/bw"))
///     .timeout(Duration::from_secs(5))
///     .single()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Call<'a, C: Connector> {
    client: &'a Client<C>,
    request: ApiRequest,
    opts: CallOptions,
}

impl<'a, C: Connector> Call<'a, C> {
    pub(crate) fn new(client: &'a Client<C>, request: ApiRequest, opts: CallOptions) -> Self {
        Self {
            client,
            request,
            opts,
        }
    }

    /// Fail with a timeout error if the call takes longer than `timeout`.
    ///
    /// Streamed bodies ([`Call::stream`], [`Call::byte_stream`]) also end
    /// with a timeout error once no chunk arrives within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = Some(timeout);
        self
    }

    /// Add an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.opts.headers.push((name, value));
        self
    }

    /// Ask the daemon not to use the network for this call.
    pub fn offline(mut self, offline: bool) -> Self {
        self.opts.offline = Some(offline);
        self
    }

    /// Overlay a set of options on the current ones.
    pub fn options(mut self, opts: CallOptions) -> Self {
        self.opts = opts.merged_over(&self.opts);
        self
    }

    /// The request this call will send.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Send and return the raw response body.
    pub async fn bytes(self) -> Result<Bytes> {
        self.client
            .send_buffered(&self.request, &self.opts, Method::POST)
            .await
    }

    /// Send and decode every JSON value in the response.
    pub async fn json<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let body = self.bytes().await?;
        Ok(decode_json_items(&body)?)
    }

    /// Send and decode the first JSON value in the response.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.bytes().await?;
        Ok(decode_single(&body)?)
    }

    /// Send and ignore the response body.
    pub async fn discard(self) -> Result<()> {
        let method = self.client.method_for(&self.request, &self.opts);
        self.client
            .send_buffered(&self.request, &self.opts, method)
            .await?;
        Ok(())
    }

    /// Send and return the response body as it arrives.
    pub async fn byte_stream(self) -> Result<ByteStream> {
        self.client.send_streaming(&self.request, &self.opts).await
    }

    /// Send and decode JSON values as they arrive.
    pub async fn stream<T>(self) -> Result<BoxStream<'static, std::result::Result<T, ClientError>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let body = self.byte_stream().await?;
        Ok(json_stream(body).boxed())
    }
}
