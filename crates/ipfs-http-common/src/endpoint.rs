//! Mapping from daemon multiaddrs to HTTP endpoints.
//!
//! The daemon advertises its API as a multiaddr such as
//! `/dns/localhost/tcp/5001/http`. Only addresses of the shape
//! `/<ip4|ip6|dns|dns4|dns6>/<host>/tcp/<port>[/http|/https]` can be reached
//! over HTTP; everything else is rejected with [`AddressError::Unsupported`].

use multiaddr::{Multiaddr, Protocol};
use url::Url;

/// Errors produced while turning a multiaddr into a URL.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AddressError {
    /// The string is not a multiaddr at all
    #[error("invalid multiaddr {addr:?}: {source}")]
    #[diagnostic(code(ipfs_http::address::parse))]
    Parse {
        /// The offending input
        addr: String,
        /// Parser error
        #[source]
        source: multiaddr::Error,
    },
    /// The multiaddr is well formed but has no HTTP mapping
    #[error("unsupported API address {0}")]
    #[diagnostic(
        code(ipfs_http::address::unsupported),
        help("expected /ip4|ip6|dns|dns4|dns6/<host>/tcp/<port>, optionally followed by /http or /https")
    )]
    Unsupported(String),
    /// The resulting URL failed to parse
    #[error("invalid endpoint URL: {0}")]
    #[diagnostic(code(ipfs_http::address::url))]
    Url(#[from] url::ParseError),
}

/// Parse a multiaddr string, keeping the input around for error reporting.
pub fn parse_multiaddr(addr: &str) -> Result<Multiaddr, AddressError> {
    addr.parse().map_err(|source| AddressError::Parse {
        addr: addr.to_owned(),
        source,
    })
}

/// Resolve a multiaddr to the root URL of the HTTP endpoint it names.
pub fn resolve_endpoint(addr: &Multiaddr) -> Result<Url, AddressError> {
    let unsupported = || AddressError::Unsupported(addr.to_string());
    let mut protocols = addr.iter();

    let host = match protocols.next() {
        Some(Protocol::Ip4(ip)) => ip.to_string(),
        Some(Protocol::Ip6(ip)) => format!("[{ip}]"),
        Some(Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name)) => {
            name.into_owned()
        }
        _ => return Err(unsupported()),
    };

    let port = match protocols.next() {
        Some(Protocol::Tcp(port)) => port,
        _ => return Err(unsupported()),
    };

    let scheme = match protocols.next() {
        None | Some(Protocol::Http) => "http",
        Some(Protocol::Https) => "https",
        Some(_) => return Err(unsupported()),
    };

    if protocols.next().is_some() {
        return Err(unsupported());
    }

    Ok(Url::parse(&format!("{scheme}://{host}:{port}/"))?)
}

/// Resolve a multiaddr and append the API base path (e.g. `api/v0`).
///
/// The returned URL always ends in `/` so method paths can be joined onto it.
pub fn api_base_url(addr: &Multiaddr, base: &str) -> Result<Url, AddressError> {
    let mut url = resolve_endpoint(addr)?;
    let base = base.trim_matches('/');
    if !base.is_empty() {
        url.set_path(&format!("/{base}/"));
    }
    Ok(url)
}
