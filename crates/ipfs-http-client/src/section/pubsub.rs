//! `pubsub/*`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::stream::BoxStream;
use ipfs_http_common::ClientError;
use ipfs_http_common::error::{DecodeError, Result};
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::{Strings, nullable};

section! {
    /// Publish/subscribe messaging, see [`Client::pubsub`].
    PubsubApi
}

/// A message received on a subscription.
///
/// Binary fields arrive base64 encoded; use the accessor methods to decode
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PubsubMessage {
    /// Sender peer ID bytes, base64
    #[serde(default)]
    pub from: String,
    /// Payload, base64
    #[serde(default)]
    pub data: String,
    /// Sequence number bytes, base64
    #[serde(default)]
    pub seqno: String,
    /// Topics the message was published to
    #[serde(rename = "topicIDs", default, deserialize_with = "nullable")]
    pub topic_ids: Vec<String>,
}

impl PubsubMessage {
    /// Decoded payload.
    pub fn data(&self) -> std::result::Result<Vec<u8>, DecodeError> {
        Ok(STANDARD.decode(&self.data)?)
    }

    /// Decoded sequence number.
    pub fn seqno(&self) -> std::result::Result<u64, DecodeError> {
        let raw = STANDARD.decode(&self.seqno)?;
        Ok(raw.iter().fold(0u64, |n, b| (n << 8) | u64::from(*b)))
    }
}

impl<C: Connector> PubsubApi<'_, C> {
    /// Topics this node is subscribed to.
    pub async fn ls(&self) -> Result<Vec<String>> {
        let topics: Strings = self.call(ApiRequest::new("pubsub/ls")).single().await?;
        Ok(topics.strings)
    }

    /// Peers we exchange pubsub messages with, optionally only those on `topic`.
    pub async fn peers(&self, topic: Option<&str>) -> Result<Vec<String>> {
        let mut request = ApiRequest::new("pubsub/peers");
        if let Some(topic) = topic {
            request = request.arg(topic);
        }
        let peers: Strings = self.call(request).single().await?;
        Ok(peers.strings)
    }

    /// Publish `payload` to `topic`.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.call(ApiRequest::new("pubsub/pub").arg(topic).arg(payload))
            .discard()
            .await
    }

    /// Subscribe to `topic`; messages are yielded until the stream is dropped.
    pub async fn subscribe(
        &self,
        topic: &str,
        discover: bool,
    ) -> Result<BoxStream<'static, std::result::Result<PubsubMessage, ClientError>>> {
        self.call(
            ApiRequest::new("pubsub/sub")
                .arg(topic)
                .flag("discover", discover),
        )
        .stream()
        .await
    }
}
