//! `pin/*`

use std::collections::BTreeMap;

use futures::stream::BoxStream;
use ipfs_http_common::ClientError;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::nullable;

section! {
    /// Pinning, see [`Client::pin`].
    PinApi
}

/// Which pins `pin/ls` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinKind {
    /// Every pin
    #[default]
    All,
    /// Pins on a single block
    Direct,
    /// Blocks pinned through a recursive pin on an ancestor
    Indirect,
    /// Pins on a whole DAG
    Recursive,
}

impl PinKind {
    /// Name the daemon uses for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Direct => "direct",
            Self::Indirect => "indirect",
            Self::Recursive => "recursive",
        }
    }
}

/// How a CID is pinned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PinEntry {
    /// `direct`, `indirect` or `recursive`
    #[serde(rename = "Type")]
    pub kind: String,
}

/// A block that failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BadNode {
    /// CID of the block
    pub cid: String,
    /// What is wrong with it
    pub err: String,
}

/// Verification result for one pin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PinStatus {
    /// The pinned CID
    pub cid: String,
    /// Whether the whole DAG is intact
    pub ok: bool,
    /// Broken blocks below the pin
    #[serde(default, deserialize_with = "nullable")]
    pub bad_nodes: Vec<BadNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Pins {
    #[serde(default, deserialize_with = "nullable")]
    pins: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinList {
    #[serde(default, deserialize_with = "nullable")]
    keys: BTreeMap<String, PinEntry>,
}

impl<C: Connector> PinApi<'_, C> {
    /// Pin CIDs or paths. Returns the pinned CIDs.
    pub async fn add<I>(&self, cids: I, recursive: bool) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let request = ApiRequest::new("pin/add")
            .args_from(cids)
            .flag("recursive", recursive);
        let pins: Pins = self.call(request).single().await?;
        Ok(pins.pins)
    }

    /// Pinned CIDs of the given kind, mapped to how each is pinned.
    pub async fn ls(&self, kind: PinKind) -> Result<BTreeMap<String, PinEntry>> {
        let request = ApiRequest::new("pin/ls").param("type", kind.as_str());
        let list: PinList = self.call(request).single().await?;
        Ok(list.keys)
    }

    /// Unpin CIDs or paths. Returns the unpinned CIDs.
    pub async fn rm<I>(&self, cids: I, recursive: bool) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let request = ApiRequest::new("pin/rm")
            .args_from(cids)
            .flag("recursive", recursive);
        let pins: Pins = self.call(request).single().await?;
        Ok(pins.pins)
    }

    /// Move a recursive pin from `from` to `to`, keeping `from` pinned
    /// unless `unpin` is set.
    pub async fn update(
        &self,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        unpin: bool,
    ) -> Result<Vec<String>> {
        let request = ApiRequest::new("pin/update")
            .arg(from)
            .arg(to)
            .flag("unpin", unpin);
        let pins: Pins = self.call(request).single().await?;
        Ok(pins.pins)
    }

    /// Check every recursive pin, yielding one status per pin.
    pub async fn verify(
        &self,
        verbose: bool,
    ) -> Result<BoxStream<'static, std::result::Result<PinStatus, ClientError>>> {
        self.call(ApiRequest::new("pin/verify").flag("verbose", verbose))
            .stream()
            .await
    }
}
