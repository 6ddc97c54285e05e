#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use http::StatusCode;
use ipfs_http_client::common::http_client::ByteStream;
use ipfs_http_client::{
    Client, ClientConfig, ConnectMode, Connector, EncodeError, HttpClient, HttpClientExt,
    TransportError,
};
use tokio::sync::Mutex;

/// A canned daemon reply.
pub struct MockReply {
    status: StatusCode,
    chunks: Vec<Bytes>,
    delay: Option<Duration>,
    refused: bool,
    stall: bool,
}

impl MockReply {
    pub fn json(value: serde_json::Value) -> Self {
        Self::body(StatusCode::OK, serde_json::to_vec(&value).unwrap())
    }

    pub fn body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            chunks: vec![body.into()],
            delay: None,
            refused: false,
            stall: false,
        }
    }

    pub fn empty() -> Self {
        Self::body(StatusCode::OK, Bytes::new())
    }

    /// A 200 reply whose body arrives in the given pieces.
    pub fn chunks(chunks: &[&'static str]) -> Self {
        Self {
            status: StatusCode::OK,
            chunks: chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect(),
            delay: None,
            refused: false,
            stall: false,
        }
    }

    /// A reply whose body stops arriving after `head`, without ending.
    pub fn stalled(status: StatusCode, head: &'static str) -> Self {
        Self {
            stall: true,
            ..Self::body(status, Bytes::from_static(head.as_bytes()))
        }
    }

    pub fn refused() -> Self {
        Self {
            refused: true,
            ..Self::empty()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn version(version: &str) -> Self {
        Self::json(serde_json::json!({
            "Version": version,
            "Commit": "",
            "Repo": "7",
            "System": "amd64/linux",
            "Golang": "go1.13.8"
        }))
    }
}

#[derive(Clone, Default)]
pub struct MockClient {
    // Queue of replies to pop for each request
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    // Capture requests for assertions
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
    // Sizes of the chunks each streamed upload arrived in
    uploads: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl MockClient {
    pub async fn push(&self, reply: MockReply) {
        self.queue.lock().await.push_back(reply);
    }

    pub async fn take_log(&self) -> Vec<http::Request<Vec<u8>>> {
        let mut log = self.log.lock().await;
        std::mem::take(&mut *log)
    }

    pub async fn take_uploads(&self) -> Vec<Vec<usize>> {
        let mut uploads = self.uploads.lock().await;
        std::mem::take(&mut *uploads)
    }

    async fn next(&self, request: http::Request<Vec<u8>>) -> Result<MockReply, TransportError> {
        self.log.lock().await.push(request);
        let reply = self
            .queue
            .lock()
            .await
            .pop_front()
            .expect("no queued response");
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        if reply.refused {
            return Err(TransportError::Connect("connection refused".into()));
        }
        Ok(reply)
    }

    async fn respond_streaming(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<ByteStream>, TransportError> {
        let reply = self.next(request).await?;
        let head = futures::stream::iter(reply.chunks.into_iter().map(Ok));
        let body: ByteStream = if reply.stall {
            Box::pin(head.chain(futures::stream::pending()))
        } else {
            Box::pin(head)
        };
        Ok(http::Response::builder().status(reply.status).body(body).unwrap())
    }
}

impl HttpClient for MockClient {
    type Error = TransportError;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let this = self.clone();
        async move {
            let reply = this.next(request).await?;
            if reply.stall {
                std::future::pending::<()>().await;
            }
            let body: Vec<u8> = reply.chunks.concat();
            Ok(http::Response::builder().status(reply.status).body(body).unwrap())
        }
    }
}

impl HttpClientExt for MockClient {
    fn send_http_streaming(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<ByteStream>, Self::Error>,
    > + Send {
        let this = self.clone();
        async move { this.respond_streaming(request).await }
    }

    fn send_http_bidirectional<S>(
        &self,
        parts: http::request::Parts,
        body: S,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<ByteStream>, Self::Error>,
    > + Send
    where
        S: Stream<Item = Result<Bytes, EncodeError>> + Send + 'static,
    {
        let this = self.clone();
        async move {
            let chunks: Vec<Bytes> = body
                .try_collect()
                .await
                .map_err(|e| TransportError::Other(Box::new(e)))?;
            this.uploads
                .lock()
                .await
                .push(chunks.iter().map(Bytes::len).collect());
            let request = http::Request::from_parts(parts, chunks.concat());
            this.respond_streaming(request).await
        }
    }
}

/// Hands out the shared [`MockClient`] and counts how often it was asked to.
#[derive(Clone, Default)]
pub struct MockConnector {
    pub client: MockClient,
    pooled: Arc<AtomicUsize>,
    one_shot: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn pooled(&self) -> usize {
        self.pooled.load(Ordering::SeqCst)
    }

    pub fn one_shot(&self) -> usize {
        self.one_shot.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Client = MockClient;

    fn connect(&self, mode: ConnectMode) -> Result<MockClient, TransportError> {
        match mode {
            ConnectMode::Pooled => self.pooled.fetch_add(1, Ordering::SeqCst),
            ConnectMode::OneShot => self.one_shot.fetch_add(1, Ordering::SeqCst),
        };
        Ok(self.client.clone())
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::builder()
        .addr("/ip4/127.0.0.1/tcp/5001".parse().unwrap())
        .build()
}

pub fn mock_client() -> (Client<MockConnector>, MockConnector) {
    mock_client_with(config())
}

pub fn mock_client_with(config: ClientConfig) -> (Client<MockConnector>, MockConnector) {
    let connector = MockConnector::default();
    let client = Client::with_connector(connector.clone(), config).unwrap();
    (client, connector)
}

pub fn uri(request: &http::Request<Vec<u8>>) -> String {
    request.uri().to_string()
}
