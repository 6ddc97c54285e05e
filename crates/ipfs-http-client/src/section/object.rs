//! `object/*`: low-level DAG nodes.

use bytes::Bytes;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::multipart::Multipart;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::{CidRef, ObjectLink, ObjectRef, nullable};

section! {
    /// DAG nodes, see [`Client::object`].
    ObjectApi
}

section! {
    /// Node editing, see [`ObjectApi::patch`].
    ObjectPatchApi
}

/// A node with its data and links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectNode {
    /// Outgoing links
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<ObjectLink>,
    /// Node data as returned by the daemon
    #[serde(default)]
    pub data: String,
}

/// Sizes reported by `object/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectStat {
    /// CID of the node
    pub hash: String,
    /// Number of links
    #[serde(default)]
    pub num_links: u64,
    /// Size of the encoded node
    #[serde(default)]
    pub block_size: u64,
    /// Size of the links section
    #[serde(default)]
    pub links_size: u64,
    /// Size of the data section
    #[serde(default)]
    pub data_size: u64,
    /// Size of the whole DAG below the node
    #[serde(default)]
    pub cumulative_size: u64,
}

/// One difference reported by `object/diff`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectChange {
    /// 0 = added, 1 = removed, 2 = modified
    #[serde(rename = "Type")]
    pub kind: i32,
    /// Path of the changed link
    #[serde(default)]
    pub path: String,
    /// Target before the change
    #[serde(default)]
    pub before: Option<CidRef>,
    /// Target after the change
    #[serde(default)]
    pub after: Option<CidRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Changes {
    #[serde(default, deserialize_with = "nullable")]
    changes: Vec<ObjectChange>,
}

impl<'a, C: Connector> ObjectApi<'a, C> {
    /// Raw data section of a node.
    pub async fn data(&self, cid: impl AsRef<str>) -> Result<Bytes> {
        self.call(ApiRequest::new("object/data").arg(cid)).bytes().await
    }

    /// A node with its data and links.
    pub async fn get(&self, cid: impl AsRef<str>) -> Result<ObjectNode> {
        self.call(ApiRequest::new("object/get").arg(cid)).single().await
    }

    /// Links of a node.
    pub async fn links(&self, cid: impl AsRef<str>) -> Result<ObjectRef> {
        self.call(ApiRequest::new("object/links").arg(cid)).single().await
    }

    /// Create an empty node, or one from a template such as `unixfs-dir`.
    #[allow(clippy::new_ret_no_self)]
    pub async fn new(&self, template: Option<&str>) -> Result<ObjectRef> {
        let mut request = ApiRequest::new("object/new");
        if let Some(template) = template {
            request = request.arg(template);
        }
        self.call(request).single().await
    }

    /// Store a node given in its JSON encoding.
    pub async fn put(&self, node: impl Into<Bytes>) -> Result<ObjectRef> {
        let body = Multipart::new(self.client.chunk_size()).bytes(node).finish();
        self.call(ApiRequest::new("object/put").multipart(body))
            .single()
            .await
    }

    /// Sizes of a node.
    pub async fn stat(&self, cid: impl AsRef<str>) -> Result<ObjectStat> {
        self.call(ApiRequest::new("object/stat").arg(cid)).single().await
    }

    /// Link-level differences between two nodes.
    pub async fn diff(&self, a: impl AsRef<str>, b: impl AsRef<str>) -> Result<Vec<ObjectChange>> {
        let changes: Changes = self
            .call(ApiRequest::new("object/diff").arg(a).arg(b))
            .single()
            .await?;
        Ok(changes.changes)
    }

    /// Calls that derive a new node from an existing one (`object/patch/*`).
    pub fn patch(&self) -> ObjectPatchApi<'a, C> {
        ObjectPatchApi::from_parts(self.client, self.opts.clone())
    }
}

impl<C: Connector> ObjectPatchApi<'_, C> {
    /// Add a link named `name` pointing at `target`.
    ///
    /// With `create`, intermediate nodes on a `/`-separated `name` are made
    /// as needed.
    pub async fn add_link(
        &self,
        root: impl AsRef<str>,
        name: &str,
        target: impl AsRef<str>,
        create: bool,
    ) -> Result<ObjectRef> {
        let request = ApiRequest::new("object/patch/add-link")
            .arg(root)
            .arg(name)
            .arg(target)
            .flag("create", create);
        self.call(request).single().await
    }

    /// Remove the link named `name`.
    pub async fn rm_link(&self, root: impl AsRef<str>, name: &str) -> Result<ObjectRef> {
        self.call(ApiRequest::new("object/patch/rm-link").arg(root).arg(name))
            .single()
            .await
    }

    /// Append to the data section.
    pub async fn append_data(
        &self,
        root: impl AsRef<str>,
        data: impl Into<Bytes>,
    ) -> Result<ObjectRef> {
        self.patch_data("object/patch/append-data", root.as_ref(), data.into())
            .await
    }

    /// Replace the data section.
    pub async fn set_data(&self, root: impl AsRef<str>, data: impl Into<Bytes>) -> Result<ObjectRef> {
        self.patch_data("object/patch/set-data", root.as_ref(), data.into())
            .await
    }

    async fn patch_data(&self, path: &str, root: &str, data: Bytes) -> Result<ObjectRef> {
        let body = Multipart::new(self.client.chunk_size()).bytes(data).finish();
        self.call(ApiRequest::new(path).arg(root).multipart(body))
            .single()
            .await
    }
}
