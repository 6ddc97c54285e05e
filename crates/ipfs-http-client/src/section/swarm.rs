//! `swarm/*`

use std::collections::BTreeMap;

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::{Strings, nullable};

section! {
    /// Peer connections, see [`Client::swarm`].
    SwarmApi
}

section! {
    /// Address filters, see [`SwarmApi::filters`].
    SwarmFiltersApi
}

/// An open connection to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SwarmPeer {
    /// Remote address of the connection
    pub addr: String,
    /// Peer ID
    pub peer: String,
    /// Latency, when requested
    #[serde(default)]
    pub latency: String,
    /// Stream multiplexer, when requested
    #[serde(default)]
    pub muxer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Peers {
    #[serde(default, deserialize_with = "nullable")]
    peers: Vec<SwarmPeer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Addrs {
    #[serde(default, deserialize_with = "nullable")]
    addrs: BTreeMap<String, Vec<String>>,
}

impl<'a, C: Connector> SwarmApi<'a, C> {
    /// Peers with an open connection.
    pub async fn peers(&self) -> Result<Vec<SwarmPeer>> {
        let peers: Peers = self.call(ApiRequest::new("swarm/peers")).single().await?;
        Ok(peers.peers)
    }

    /// Known addresses of every peer in the address book.
    pub async fn addrs(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let addrs: Addrs = self.call(ApiRequest::new("swarm/addrs")).single().await?;
        Ok(addrs.addrs)
    }

    /// Open connections to the given multiaddrs.
    pub async fn connect<I>(&self, addrs: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let status: Strings = self
            .call(ApiRequest::new("swarm/connect").args_from(addrs))
            .single()
            .await?;
        Ok(status.strings)
    }

    /// Close connections to the given multiaddrs.
    pub async fn disconnect<I>(&self, addrs: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let status: Strings = self
            .call(ApiRequest::new("swarm/disconnect").args_from(addrs))
            .single()
            .await?;
        Ok(status.strings)
    }

    /// Calls on the address filter list (`swarm/filters/*`).
    pub fn filters(&self) -> SwarmFiltersApi<'a, C> {
        SwarmFiltersApi::from_parts(self.client, self.opts.clone())
    }
}

impl<C: Connector> SwarmFiltersApi<'_, C> {
    /// Add filters, e.g. `/ip4/10.0.0.0/ipcidr/8`.
    pub async fn add<I>(&self, filters: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let added: Strings = self
            .call(ApiRequest::new("swarm/filters/add").args_from(filters))
            .single()
            .await?;
        Ok(added.strings)
    }

    /// Remove filters.
    pub async fn rm<I>(&self, filters: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let removed: Strings = self
            .call(ApiRequest::new("swarm/filters/rm").args_from(filters))
            .single()
            .await?;
        Ok(removed.strings)
    }
}
