//! `config/*`

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::multipart::Multipart;
use ipfs_http_common::request::{ApiRequest, EncodeError};
use serde::Deserialize;
use serde_json::Value;

use crate::client::Client;

section! {
    /// The daemon configuration, see [`Client::config`].
    ConfigApi
}

/// A single configuration entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigEntry {
    /// Dotted key, e.g. `Addresses.API`
    pub key: String,
    /// Current value
    pub value: Value,
}

impl<C: Connector> ConfigApi<'_, C> {
    /// The whole configuration document.
    pub async fn show(&self) -> Result<Value> {
        self.call(ApiRequest::new("config/show")).single().await
    }

    /// Value of one key.
    pub async fn get(&self, key: &str) -> Result<Value> {
        let entry: ConfigEntry = self.call(ApiRequest::new("config").arg(key)).single().await?;
        Ok(entry.value)
    }

    /// Set one key. Strings are stored as-is, anything else as JSON.
    pub async fn set(&self, key: &str, value: &Value) -> Result<ConfigEntry> {
        let request = ApiRequest::new("config").arg(key);
        let request = match value {
            Value::String(s) => request.arg(s),
            other => request.arg(other.to_string()).flag("json", true),
        };
        self.call(request).single().await
    }

    /// Replace the whole configuration document.
    pub async fn replace(&self, config: &Value) -> Result<()> {
        let data = serde_json::to_vec(config).map_err(EncodeError::from)?;
        let body = Multipart::new(self.client.chunk_size()).bytes(data).finish();
        self.call(ApiRequest::new("config/replace").multipart(body))
            .discard()
            .await
    }
}
