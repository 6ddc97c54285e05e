//! `repo/*`

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::CidRef;

section! {
    /// The local repository, see [`Client::repo`].
    RepoApi
}

/// One line of garbage collection output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GcEntry {
    /// Removed block
    #[serde(default)]
    pub key: Option<CidRef>,
    /// Failure while removing a block
    #[serde(default)]
    pub error: Option<String>,
}

/// Repository statistics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepoStat {
    /// Number of stored objects
    #[serde(default)]
    pub num_objects: u64,
    /// Bytes used on disk
    #[serde(default)]
    pub repo_size: u64,
    /// Location of the repository
    #[serde(default)]
    pub repo_path: String,
    /// Repository format version
    #[serde(default)]
    pub version: String,
    /// Configured storage limit in bytes
    #[serde(default)]
    pub storage_max: u64,
}

impl<C: Connector> RepoApi<'_, C> {
    /// Remove unpinned blocks.
    ///
    /// With `quiet` the daemon does not report the removed keys.
    pub async fn gc(&self, quiet: bool) -> Result<Vec<GcEntry>> {
        self.call(ApiRequest::new("repo/gc").flag("quiet", quiet))
            .json()
            .await
    }

    /// Size and object count of the repository.
    pub async fn stat(&self) -> Result<RepoStat> {
        self.call(ApiRequest::new("repo/stat")).single().await
    }
}
