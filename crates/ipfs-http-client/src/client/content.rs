//! Adding and reading content: `add`, `cat`, `get`, `ls` and the JSON helpers.

use std::path::Path;

use bon::Builder;
use bytes::Bytes;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::multipart::Multipart;
use ipfs_http_common::request::{ApiRequest, EncodeError, decode_single};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::types::nullable;

/// One entry reported by `add`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddedObject {
    /// Path of the entry relative to what was uploaded
    #[serde(default)]
    pub name: String,
    /// CID of the entry
    pub hash: String,
    /// Cumulative size, as reported by the daemon
    #[serde(default)]
    pub size: Option<String>,
}

/// Options for `add`.
#[derive(Debug, Clone, Default, Serialize, Builder)]
pub struct AddOptions {
    /// Descend into subdirectories of uploaded directories
    #[serde(skip)]
    #[builder(default)]
    pub recursive: bool,
    /// Pin the added content (daemon default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<bool>,
    /// Only compute the CIDs, do not store anything
    #[serde(rename = "only-hash", skip_serializing_if = "Option::is_none")]
    pub only_hash: Option<bool>,
    /// Wrap the uploaded files in a directory
    #[serde(rename = "wrap-with-directory", skip_serializing_if = "Option::is_none")]
    pub wrap_with_directory: Option<bool>,
    /// Use raw blocks for leaf nodes
    #[serde(rename = "raw-leaves", skip_serializing_if = "Option::is_none")]
    pub raw_leaves: Option<bool>,
    /// CID version to produce
    #[serde(rename = "cid-version", skip_serializing_if = "Option::is_none")]
    pub cid_version: Option<u8>,
    /// Use the trickle DAG layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trickle: Option<bool>,
    /// Chunking algorithm, e.g. `size-262144` or `rabin`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub chunker: Option<String>,
    /// Hash function
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub hash: Option<String>,
}

/// A link listed by `ls`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LsLink {
    /// Entry name
    pub name: String,
    /// CID of the entry
    pub hash: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Unixfs type: 1 = directory, 2 = file
    #[serde(rename = "Type", default)]
    pub kind: i32,
    /// Symlink target, if any
    #[serde(default)]
    pub target: String,
}

/// An object listed by `ls`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LsObject {
    /// The listed path or CID
    pub hash: String,
    /// Its entries
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<LsLink>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsResponse {
    #[serde(default, deserialize_with = "nullable")]
    objects: Vec<LsObject>,
}

impl<C: Connector> Client<C> {
    /// Add files and directories from disk.
    ///
    /// Returns one entry per uploaded file and directory, the last one being
    /// the outermost.
    pub async fn add<I, P>(&self, paths: I, options: &AddOptions) -> Result<Vec<AddedObject>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut body = Multipart::new(self.chunk_size);
        for path in paths {
            let path = path.as_ref();
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|source| EncodeError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            body = if meta.is_dir() {
                body.directory(path, options.recursive).await?
            } else {
                body.file(path).await?
            };
        }

        let request = ApiRequest::new("add")
            .options(options)?
            .flag("recursive", options.recursive)
            .multipart(body.finish());
        self.call(request).json().await
    }

    /// Add a byte payload as a file and return its CID.
    pub async fn add_bytes(&self, data: impl Into<Bytes>) -> Result<String> {
        let body = Multipart::new(self.chunk_size).bytes(data).finish();
        let added: AddedObject = self
            .call(ApiRequest::new("add").multipart(body))
            .single()
            .await?;
        Ok(added.hash)
    }

    /// Add a string as a UTF-8 file and return its CID.
    pub async fn add_str(&self, text: &str) -> Result<String> {
        let body = Multipart::new(self.chunk_size).text(text).finish();
        let added: AddedObject = self
            .call(ApiRequest::new("add").multipart(body))
            .single()
            .await?;
        Ok(added.hash)
    }

    /// Serialize a value to JSON, add it as a file, and return its CID.
    pub async fn add_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let data = serde_json::to_vec(value).map_err(EncodeError::from)?;
        self.add_bytes(data).await
    }

    /// Read a file and deserialize it as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, cid: impl AsRef<str>) -> Result<T> {
        let data = self.cat(cid).await?;
        Ok(decode_single(&data)?)
    }

    /// Read the contents of a file.
    pub async fn cat(&self, cid: impl AsRef<str>) -> Result<Bytes> {
        self.call(ApiRequest::new("cat").arg(cid)).bytes().await
    }

    /// Read part of a file.
    pub async fn cat_range(
        &self,
        cid: impl AsRef<str>,
        offset: u64,
        length: Option<u64>,
    ) -> Result<Bytes> {
        let request = ApiRequest::new("cat")
            .arg(cid)
            .param("offset", offset)
            .param_opt("length", length);
        self.call(request).bytes().await
    }

    /// Download a file or directory as a tar archive.
    pub async fn get(&self, cid: impl AsRef<str>) -> Result<Bytes> {
        self.call(ApiRequest::new("get").arg(cid)).bytes().await
    }

    /// List the links of one or more directories.
    pub async fn ls<I>(&self, cids: I) -> Result<Vec<LsObject>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let response: LsResponse = self
            .call(ApiRequest::new("ls").args_from(cids))
            .single()
            .await?;
        Ok(response.objects)
    }
}
