//! Node-level calls: identity, version, name resolution, ping, shutdown.

use futures::stream::BoxStream;
use ipfs_http_common::ClientError;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use super::Client;
use crate::types::{PathResponse, nullable};

/// Identity of a node, as reported by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerIdentity {
    /// Peer ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Base64 encoded public key
    #[serde(default)]
    pub public_key: String,
    /// Addresses the node listens on
    #[serde(default, deserialize_with = "nullable")]
    pub addresses: Vec<String>,
    /// Implementation and version
    #[serde(default)]
    pub agent_version: String,
    /// Protocol version
    #[serde(default)]
    pub protocol_version: String,
}

/// Daemon version details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    /// Semantic version, e.g. `0.5.1`
    pub version: String,
    /// Git commit the daemon was built from
    #[serde(default)]
    pub commit: String,
    /// Repository format version
    #[serde(default)]
    pub repo: String,
    /// Operating system and architecture
    #[serde(default)]
    pub system: String,
    /// Go toolchain version
    #[serde(default)]
    pub golang: String,
}

/// One line of `ping` output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PingReply {
    /// Whether this ping succeeded
    pub success: bool,
    /// Round trip time in nanoseconds, zero for status lines
    #[serde(default)]
    pub time: u64,
    /// Status text
    #[serde(default)]
    pub text: String,
}

impl<C: Connector> Client<C> {
    /// Identity of this node, or of `peer` when given.
    pub async fn id(&self, peer: Option<&str>) -> Result<PeerIdentity> {
        let mut request = ApiRequest::new("id");
        if let Some(peer) = peer {
            request = request.arg(peer);
        }
        self.call(request).single().await
    }

    /// Version details of the daemon.
    pub async fn version(&self) -> Result<VersionInfo> {
        self.call(ApiRequest::new("version")).single().await
    }

    /// Resolve a DNSLink domain to the path it points to.
    pub async fn dns(&self, domain: &str, recursive: bool) -> Result<String> {
        let response: PathResponse = self
            .call(
                ApiRequest::new("dns")
                    .arg(domain)
                    .flag("recursive", recursive),
            )
            .single()
            .await?;
        Ok(response.path)
    }

    /// Resolve an `/ipns/` or `/ipfs/` path to its `/ipfs/` target.
    pub async fn resolve(&self, path: &str, recursive: bool) -> Result<String> {
        let response: PathResponse = self
            .call(
                ApiRequest::new("resolve")
                    .arg(path)
                    .flag("recursive", recursive),
            )
            .single()
            .await?;
        Ok(response.path)
    }

    /// Ping a peer `count` times, yielding replies as they come in.
    pub async fn ping(
        &self,
        peer: &str,
        count: u32,
    ) -> Result<BoxStream<'static, std::result::Result<PingReply, ClientError>>> {
        self.call(ApiRequest::new("ping").arg(peer).param("count", count))
            .stream()
            .await
    }

    /// Shut the daemon down.
    pub async fn stop(&self) -> Result<()> {
        self.call(ApiRequest::new("shutdown")).discard().await
    }
}
