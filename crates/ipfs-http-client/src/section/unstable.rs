//! Calls that are still experimental on the daemon side: `log/*` and `refs`.

use futures::stream::BoxStream;
use ipfs_http_common::ClientError;
use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;
use serde_json::Value;

use crate::client::Client;
use crate::types::Strings;

section! {
    /// Experimental calls, see [`Client::unstable`].
    UnstableApi
}

section! {
    /// Daemon logging, see [`UnstableApi::log`].
    LogApi
}

/// One reference reported by `refs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefEntry {
    /// The referenced CID
    #[serde(rename = "Ref")]
    pub cid: String,
    /// Error while walking to this reference
    #[serde(default)]
    pub err: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LogMessage {
    message: String,
}

impl<'a, C: Connector> UnstableApi<'a, C> {
    /// Calls on the daemon's log subsystems (`log/*`).
    pub fn log(&self) -> LogApi<'a, C> {
        LogApi::from_parts(self.client, self.opts.clone())
    }

    /// Blocks referenced by `cid`, the whole DAG when `recursive`.
    pub async fn refs(&self, cid: impl AsRef<str>, recursive: bool) -> Result<Vec<RefEntry>> {
        self.call(
            ApiRequest::new("refs")
                .arg(cid)
                .flag("recursive", recursive),
        )
        .json()
        .await
    }

    /// Every block in the local store.
    pub async fn refs_local(&self) -> Result<Vec<RefEntry>> {
        self.call(ApiRequest::new("refs/local")).json().await
    }
}

impl<C: Connector> LogApi<'_, C> {
    /// Set the level of a log subsystem, or of all of them with `"all"`.
    pub async fn level(&self, subsystem: &str, level: &str) -> Result<String> {
        let reply: LogMessage = self
            .call(ApiRequest::new("log/level").arg(subsystem).arg(level))
            .single()
            .await?;
        Ok(reply.message)
    }

    /// Names of the log subsystems.
    pub async fn ls(&self) -> Result<Vec<String>> {
        let subsystems: Strings = self.call(ApiRequest::new("log/ls")).single().await?;
        Ok(subsystems.strings)
    }

    /// Follow the daemon's event log.
    pub async fn tail(&self) -> Result<BoxStream<'static, std::result::Result<Value, ClientError>>> {
        self.call(ApiRequest::new("log/tail")).stream().await
    }
}
