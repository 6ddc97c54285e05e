//! `bootstrap/*`

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::nullable;

section! {
    /// The bootstrap peer list, see [`Client::bootstrap`].
    BootstrapApi
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Peers {
    #[serde(default, deserialize_with = "nullable")]
    peers: Vec<String>,
}

impl<C: Connector> BootstrapApi<'_, C> {
    /// Add peers, given as multiaddrs ending in `/p2p/<peer id>`.
    ///
    /// Returns the peers that were added.
    pub async fn add<I>(&self, peers: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let added: Peers = self
            .call(ApiRequest::new("bootstrap/add").args_from(peers))
            .single()
            .await?;
        Ok(added.peers)
    }

    /// Current bootstrap peers.
    pub async fn list(&self) -> Result<Vec<String>> {
        let list: Peers = self.call(ApiRequest::new("bootstrap/list")).single().await?;
        Ok(list.peers)
    }

    /// Remove peers. Returns the peers that were removed.
    pub async fn rm<I>(&self, peers: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let removed: Peers = self
            .call(ApiRequest::new("bootstrap/rm").args_from(peers))
            .single()
            .await?;
        Ok(removed.peers)
    }
}
