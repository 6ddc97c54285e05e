//! `name/*`: IPNS.

use bon::Builder;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::types::PathResponse;

section! {
    /// IPNS publishing and resolution, see [`Client::name`].
    NameApi
}

/// Options for `name/publish`.
#[derive(Debug, Clone, Default, Serialize, Builder)]
pub struct PublishOptions {
    /// Name of the key to publish under (default: `self`)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub key: Option<String>,
    /// Record lifetime, e.g. `24h`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub lifetime: Option<String>,
    /// Cache time-to-live hint, e.g. `1m`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub ttl: Option<String>,
    /// Check that the path resolves before publishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve: Option<bool>,
    /// Publish without being connected to the network
    #[serde(rename = "allow-offline", skip_serializing_if = "Option::is_none")]
    pub allow_offline: Option<bool>,
}

/// A published name and the path it now points to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Published {
    /// The IPNS name (peer ID of the key)
    pub name: String,
    /// The published path
    pub value: String,
}

impl<C: Connector> NameApi<'_, C> {
    /// Point the IPNS name of a key at `path`.
    pub async fn publish(&self, path: &str, options: &PublishOptions) -> Result<Published> {
        let request = ApiRequest::new("name/publish").arg(path).options(options)?;
        self.call(request).single().await
    }

    /// Resolve an IPNS name, or this node's own name when `None`.
    pub async fn resolve(&self, name: Option<&str>, recursive: bool) -> Result<String> {
        let mut request = ApiRequest::new("name/resolve").flag("recursive", recursive);
        if let Some(name) = name {
            request = request.arg(name);
        }
        let resolved: PathResponse = self.call(request).single().await?;
        Ok(resolved.path)
    }
}
