//! `dht/*`
//!
//! Most DHT calls answer with a sequence of [`QueryEvent`]s describing the
//! progress of the underlying query.

use futures::stream::BoxStream;
use ipfs_http_common::ClientError;
use ipfs_http_common::error::{DecodeError, Result};
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::nullable;

section! {
    /// The distributed hash table, see [`Client::dht`].
    DhtApi
}

/// Stream of query progress events.
pub type QueryEvents = BoxStream<'static, std::result::Result<QueryEvent, ClientError>>;

/// A peer and the addresses it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerAddrs {
    /// Peer ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Known multiaddrs
    #[serde(default, deserialize_with = "nullable")]
    pub addrs: Vec<String>,
}

/// One progress event of a DHT query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryEvent {
    /// Peer the event concerns
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Event type, one of the `QueryEvent::*` constants
    #[serde(rename = "Type")]
    pub kind: i32,
    /// Peers carried by the event
    #[serde(default, deserialize_with = "nullable")]
    pub responses: Vec<PeerAddrs>,
    /// Free-form payload: the value for [`QueryEvent::VALUE`], the message
    /// for [`QueryEvent::QUERY_ERROR`]
    #[serde(default)]
    pub extra: String,
}

impl QueryEvent {
    /// A query is being sent to a peer
    pub const SENDING_QUERY: i32 = 0;
    /// A peer answered
    pub const PEER_RESPONSE: i32 = 1;
    /// The peer being looked for was found
    pub const FINAL_PEER: i32 = 2;
    /// A peer failed to answer
    pub const QUERY_ERROR: i32 = 3;
    /// A provider was found
    pub const PROVIDER: i32 = 4;
    /// A value was found
    pub const VALUE: i32 = 5;
    /// A peer was added to the query
    pub const ADDING_PEER: i32 = 6;
    /// A peer is being dialed
    pub const DIALING_PEER: i32 = 7;
}

impl<C: Connector> DhtApi<'_, C> {
    /// Look up the addresses of a peer.
    pub async fn findpeer(&self, peer: &str) -> Result<QueryEvents> {
        self.call(ApiRequest::new("dht/findpeer").arg(peer))
            .stream()
            .await
    }

    /// Find peers providing a CID.
    pub async fn findprovs(
        &self,
        cid: impl AsRef<str>,
        num_providers: Option<u32>,
    ) -> Result<QueryEvents> {
        let request = ApiRequest::new("dht/findprovs")
            .arg(cid)
            .param_opt("num-providers", num_providers);
        self.call(request).stream().await
    }

    /// Fetch the value stored under `key`.
    pub async fn get(&self, key: &str) -> Result<String> {
        let events: Vec<QueryEvent> = self.call(ApiRequest::new("dht/get").arg(key)).json().await?;
        events
            .into_iter()
            .find(|e| e.kind == QueryEvent::VALUE)
            .map(|e| e.extra)
            .ok_or_else(|| DecodeError::MissingField("Extra").into())
    }

    /// Store `value` under `key`.
    pub async fn put(&self, key: &str, value: &str) -> Result<Vec<QueryEvent>> {
        self.call(ApiRequest::new("dht/put").arg(key).arg(value))
            .json()
            .await
    }

    /// Find the peers closest to `peer`.
    pub async fn query(&self, peer: &str) -> Result<QueryEvents> {
        self.call(ApiRequest::new("dht/query").arg(peer))
            .stream()
            .await
    }

    /// Announce that this node provides the given CIDs.
    pub async fn provide<I>(&self, cids: I, recursive: bool) -> Result<Vec<QueryEvent>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let request = ApiRequest::new("dht/provide")
            .args_from(cids)
            .flag("recursive", recursive);
        self.call(request).json().await
    }
}
