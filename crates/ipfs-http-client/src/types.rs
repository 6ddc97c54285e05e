//! Response types shared by several API sections.
//!
//! The daemon encodes its responses as PascalCase JSON and uses `null` for
//! empty lists; [`nullable`] folds those into empty collections.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A CID in IPLD link form, `{"/": "<cid>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CidRef {
    /// The CID string
    #[serde(rename = "/")]
    pub cid: String,
}

/// Response carrying a plain list of strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Strings {
    #[serde(default, deserialize_with = "nullable")]
    pub strings: Vec<String>,
}

/// Response carrying a resolved path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PathResponse {
    pub path: String,
}

/// A link from one DAG node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectLink {
    /// Link name, empty for unnamed links
    #[serde(default)]
    pub name: String,
    /// Target CID
    pub hash: String,
    /// Cumulative size of the target
    #[serde(default)]
    pub size: u64,
}

/// A DAG node identified by its CID, with its links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectRef {
    /// CID of the node
    pub hash: String,
    /// Outgoing links
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<ObjectLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_lists_become_empty() {
        let s: Strings = serde_json::from_str(r#"{"Strings":null}"#).unwrap();
        assert!(s.strings.is_empty());
        let s: Strings = serde_json::from_str(r#"{}"#).unwrap();
        assert!(s.strings.is_empty());
        let o: ObjectRef = serde_json::from_str(r#"{"Hash":"QmX","Links":null}"#).unwrap();
        assert_eq!(o.hash, "QmX");
        assert!(o.links.is_empty());
    }

    #[test]
    fn cid_ref_shape() {
        let c: CidRef = serde_json::from_str(r#"{"/":"bafy"}"#).unwrap();
        assert_eq!(c.cid, "bafy");
    }
}
