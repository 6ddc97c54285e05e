//! Common building blocks for the IPFS daemon HTTP API client.
//!
//! This crate holds everything that does not depend on a particular client
//! instance: the transport seam ([`http_client`]), request construction and
//! response decoding ([`request`]), the error taxonomy ([`error`]), address
//! resolution ([`endpoint`]), multipart bodies ([`multipart`]), configuration
//! ([`config`]) and the daemon version gate ([`version`]).

#![warn(missing_docs)]
pub use bytes;
pub use multiaddr::Multiaddr;
pub use url;

pub mod config;
pub mod endpoint;
pub mod error;
/// HTTP client abstraction used by the client crate.
pub mod http_client;
pub mod multipart;
pub mod request;
pub mod version;

pub use config::{BasicAuth, CallOptions, ClientConfig};
pub use error::{ClientError, Result};
pub use request::ApiRequest;
