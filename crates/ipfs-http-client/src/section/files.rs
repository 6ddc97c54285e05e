//! `files/*`: the daemon's mutable file system (MFS).

use bon::Builder;
use bytes::Bytes;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::multipart::Multipart;
use ipfs_http_common::request::ApiRequest;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::types::nullable;

section! {
    /// The mutable file system, see [`Client::files`].
    FilesApi
}

/// An entry listed by `files/ls`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilesEntry {
    /// Entry name
    pub name: String,
    /// 0 for files, 1 for directories; only set by long listings
    #[serde(rename = "Type", default)]
    pub kind: i32,
    /// Size in bytes; only set by long listings
    #[serde(default)]
    pub size: u64,
    /// CID; only set by long listings
    #[serde(default)]
    pub hash: String,
}

/// Result of `files/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilesStat {
    /// CID of the node
    pub hash: String,
    /// Size of the file content
    #[serde(default)]
    pub size: u64,
    /// Size of the whole DAG below the node
    #[serde(default)]
    pub cumulative_size: u64,
    /// Number of child blocks
    #[serde(default)]
    pub blocks: u64,
    /// `file` or `directory`
    #[serde(rename = "Type", default)]
    pub kind: String,
}

/// Options for `files/write`.
#[derive(Debug, Clone, Default, Serialize, Builder)]
pub struct WriteOptions {
    /// Byte offset to start writing at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Create the file if it does not exist
    #[builder(default)]
    pub create: bool,
    /// Truncate the file before writing
    #[builder(default)]
    pub truncate: bool,
    /// Create missing parent directories
    #[builder(default)]
    pub parents: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Entries {
    #[serde(default, deserialize_with = "nullable")]
    entries: Vec<FilesEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Flushed {
    cid: String,
}

impl<C: Connector> FilesApi<'_, C> {
    /// Copy `source` (an MFS path or `/ipfs/` path) to `dest`.
    pub async fn cp(&self, source: &str, dest: &str) -> Result<()> {
        self.call(ApiRequest::new("files/cp").arg(source).arg(dest))
            .discard()
            .await
    }

    /// List a directory, `/` when `path` is `None`.
    pub async fn ls(&self, path: Option<&str>, long: bool) -> Result<Vec<FilesEntry>> {
        let mut request = ApiRequest::new("files/ls").flag("long", long);
        if let Some(path) = path {
            request = request.arg(path);
        }
        let listing: Entries = self.call(request).single().await?;
        Ok(listing.entries)
    }

    /// Create a directory.
    pub async fn mkdir(&self, path: &str, parents: bool) -> Result<()> {
        self.call(ApiRequest::new("files/mkdir").arg(path).flag("parents", parents))
            .discard()
            .await
    }

    /// Status of a file or directory.
    pub async fn stat(&self, path: &str) -> Result<FilesStat> {
        self.call(ApiRequest::new("files/stat").arg(path)).single().await
    }

    /// Remove a file, or a directory when `recursive` is set.
    pub async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.call(ApiRequest::new("files/rm").arg(path).flag("recursive", recursive))
            .discard()
            .await
    }

    /// Read up to `count` bytes of a file starting at `offset`.
    pub async fn read(&self, path: &str, offset: u64, count: Option<u64>) -> Result<Bytes> {
        let request = ApiRequest::new("files/read")
            .arg(path)
            .param("offset", offset)
            .param_opt("count", count);
        self.call(request).bytes().await
    }

    /// Write `data` to a file.
    pub async fn write(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        options: &WriteOptions,
    ) -> Result<()> {
        let body = Multipart::new(self.client.chunk_size()).bytes(data).finish();
        let request = ApiRequest::new("files/write")
            .arg(path)
            .options(options)?
            .multipart(body);
        self.call(request).discard().await
    }

    /// Move or rename a file or directory.
    pub async fn mv(&self, source: &str, dest: &str) -> Result<()> {
        self.call(ApiRequest::new("files/mv").arg(source).arg(dest))
            .discard()
            .await
    }

    /// Flush a path to disk and return the CID of the flushed node.
    pub async fn flush(&self, path: Option<&str>) -> Result<String> {
        let mut request = ApiRequest::new("files/flush");
        if let Some(path) = path {
            request = request.arg(path);
        }
        let flushed: Flushed = self.call(request).single().await?;
        Ok(flushed.cid)
    }
}
