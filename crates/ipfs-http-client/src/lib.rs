//! # ipfs-http-client
//!
//! Typed async client for the HTTP API of a running IPFS daemon
//! (`/api/v0`).
//!
//! The client only speaks HTTP: it builds requests, decodes responses, maps
//! daemon error payloads to [`ClientError`] and, on request, keeps one
//! pooled connection open across calls.
//!
//! ## Example
//!
//! Add a JSON document, read it back, and pin it.
//!
//! ```no_run
//! use ipfs_http_client::{ClientConfig, connect};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let client = connect(ClientConfig::from_env()?).await?;
//!
//!     let session = client.session()?;
//!     let cid = session.add_json(&json!({"hello": "world"})).await?;
//!     let back: serde_json::Value = session.get_json(&cid).await?;
//!     assert_eq!(back["hello"], "world");
//!
//!     session.pin().add([&cid], true).await?;
//!     for (cid, pin) in session.pin().ls(Default::default()).await? {
//!         println!("{cid} {}", pin.kind);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! Without a session every call opens and closes its own connection. A
//! session, opened with [`Client::session`], [`Client::open_session`] or
//! [`ClientConfig::session`], shares one connection pool between calls until
//! it is closed.
//!
//! ## Sections
//!
//! Calls are grouped by API area the same way the daemon groups them:
//! `client.pin().add(..)` is `pin/add`, `client.swarm().filters().rm(..)` is
//! `swarm/filters/rm`. Calls on the root of the API (`add`, `cat`, `id`, …)
//! live directly on [`Client`]. Anything not covered can be sent with
//! [`Client::call`].

#![warn(missing_docs)]

/// The client, its sessions, and the calls on the API root
pub mod client;
pub mod section;
mod types;

pub use client::{
    AddOptions, AddedObject, Call, Client, LsLink, LsObject, PeerIdentity, PingReply,
    SessionGuard, VersionInfo, connect_with,
};
#[cfg(feature = "reqwest-client")]
pub use client::{BasicClient, connect};
pub use ipfs_http_common::error::{
    ClientError, DecodeError, ErrorResponse, HttpError, Result, TransportError,
};
pub use ipfs_http_common::http_client::{ConnectMode, Connector, HttpClient, HttpClientExt};
pub use ipfs_http_common::request::{ApiRequest, EncodeError};
pub use ipfs_http_common::version::{Version, VersionMismatch, VersionRange};
pub use ipfs_http_common::{BasicAuth, CallOptions, ClientConfig, Multiaddr};
pub use types::{CidRef, ObjectLink, ObjectRef};

/// The building blocks crate, for custom transports and raw requests
pub use ipfs_http_common as common;
