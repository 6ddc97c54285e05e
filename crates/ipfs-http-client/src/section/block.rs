//! `block/*`

use bytes::Bytes;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::multipart::Multipart;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;

section! {
    /// Raw blocks, see [`Client::block`].
    BlockApi
}

/// Key and size of a stored block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockStat {
    /// CID of the block
    pub key: String,
    /// Size in bytes
    pub size: u64,
}

/// Outcome of removing one block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockRemoved {
    /// CID of the block
    pub hash: String,
    /// Why the block could not be removed, if it wasn't
    #[serde(default)]
    pub error: Option<String>,
}

impl<C: Connector> BlockApi<'_, C> {
    /// Raw content of a block.
    pub async fn get(&self, cid: impl AsRef<str>) -> Result<Bytes> {
        self.call(ApiRequest::new("block/get").arg(cid)).bytes().await
    }

    /// Store `data` as a block, optionally with a codec such as `dag-cbor`.
    pub async fn put(&self, data: impl Into<Bytes>, format: Option<&str>) -> Result<BlockStat> {
        let body = Multipart::new(self.client.chunk_size()).bytes(data).finish();
        let request = ApiRequest::new("block/put")
            .param_opt("format", format)
            .multipart(body);
        self.call(request).single().await
    }

    /// Key and size of a block.
    pub async fn stat(&self, cid: impl AsRef<str>) -> Result<BlockStat> {
        self.call(ApiRequest::new("block/stat").arg(cid)).single().await
    }

    /// Remove blocks from the local store.
    ///
    /// Failures for individual blocks are reported in [`BlockRemoved::error`]
    /// rather than failing the whole call.
    pub async fn rm<I>(&self, cids: I, force: bool) -> Result<Vec<BlockRemoved>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let request = ApiRequest::new("block/rm")
            .args_from(cids)
            .flag("force", force);
        self.call(request).json().await
    }
}
