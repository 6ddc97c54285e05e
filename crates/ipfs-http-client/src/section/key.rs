//! `key/*`

use ipfs_http_common::error::Result;
use ipfs_http_common::http_client::Connector;
use ipfs_http_common::request::ApiRequest;
use serde::Deserialize;

use crate::client::Client;
use crate::types::nullable;

section! {
    /// The keystore, see [`Client::key`].
    KeyApi
}

/// A named key and the peer ID derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyInfo {
    /// Key name
    pub name: String,
    /// Peer ID of the key
    pub id: String,
}

/// Result of `key/rename`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyRenamed {
    /// Old name
    pub was: String,
    /// New name
    pub now: String,
    /// Peer ID of the key
    pub id: String,
    /// Whether an existing key was replaced
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Keys {
    #[serde(default, deserialize_with = "nullable")]
    keys: Vec<KeyInfo>,
}

impl<C: Connector> KeyApi<'_, C> {
    /// Generate a key of the given type (`rsa`, `ed25519`) and bit size
    /// (`key/gen`).
    pub async fn generate(&self, name: &str, kind: &str, size: Option<u32>) -> Result<KeyInfo> {
        let request = ApiRequest::new("key/gen")
            .arg(name)
            .param("type", kind)
            .param_opt("size", size);
        self.call(request).single().await
    }

    /// All keys in the keystore.
    pub async fn list(&self) -> Result<Vec<KeyInfo>> {
        let keys: Keys = self.call(ApiRequest::new("key/list")).single().await?;
        Ok(keys.keys)
    }

    /// Rename a key, replacing `new` if it exists and `force` is set.
    pub async fn rename(&self, old: &str, new: &str, force: bool) -> Result<KeyRenamed> {
        let request = ApiRequest::new("key/rename")
            .arg(old)
            .arg(new)
            .flag("force", force);
        self.call(request).single().await
    }

    /// Remove keys, returning the removed ones.
    pub async fn rm<I>(&self, names: I) -> Result<Vec<KeyInfo>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Keys = self
            .call(ApiRequest::new("key/rm").args_from(names))
            .single()
            .await?;
        Ok(keys.keys)
    }
}
