//! `bitswap/*`

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::{CidRef, nullable};

section! {
    /// Block exchange state, see [`Client::bitswap`].
    BitswapApi
}

/// Counters reported by `bitswap/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BitswapStat {
    /// Blocks waiting to be announced
    #[serde(default)]
    pub provide_buf_len: i64,
    /// Blocks this node is looking for
    #[serde(default, deserialize_with = "nullable")]
    pub wantlist: Vec<CidRef>,
    /// Connected bitswap partners
    #[serde(default, deserialize_with = "nullable")]
    pub peers: Vec<String>,
    /// Blocks received
    #[serde(default)]
    pub blocks_received: u64,
    /// Bytes received
    #[serde(default)]
    pub data_received: u64,
    /// Blocks sent
    #[serde(default)]
    pub blocks_sent: u64,
    /// Bytes sent
    #[serde(default)]
    pub data_sent: u64,
    /// Blocks received more than once
    #[serde(default)]
    pub dup_blks_received: u64,
    /// Bytes received more than once
    #[serde(default)]
    pub dup_data_received: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Wantlist {
    #[serde(default, deserialize_with = "nullable")]
    keys: Vec<CidRef>,
}

impl<C: Connector> BitswapApi<'_, C> {
    /// Blocks this node (or `peer`, when given) currently wants.
    pub async fn wantlist(&self, peer: Option<&str>) -> Result<Vec<String>> {
        let request = ApiRequest::new("bitswap/wantlist").param_opt("peer", peer);
        let list: Wantlist = self.call(request).single().await?;
        Ok(list.keys.into_iter().map(|k| k.cid).collect())
    }

    /// Exchange counters.
    pub async fn stat(&self) -> Result<BitswapStat> {
        self.call(ApiRequest::new("bitswap/stat")).single().await
    }
}
