//! Per-area views over a [`Client`].
//!
//! Each API area of the daemon (`pin/*`, `swarm/*`, …) gets its own struct
//! borrowing the client, obtained through an accessor such as
//! [`Client::pin`]. A section carries its own
//! [`CallOptions`](ipfs_http_common::CallOptions), starting out as the
//! client's defaults; [`PinApi::with_options`] and friends layer more on top
//! for every call made through that section value.

use ipfs_http_common::http_client::Connector;

use crate::client::Client;

macro_rules! section {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<'a, C: Connector> {
            client: &'a Client<C>,
            opts: ipfs_http_common::CallOptions,
        }

        impl<'a, C: Connector> $name<'a, C> {
            pub(crate) fn from_parts(client: &'a Client<C>, opts: ipfs_http_common::CallOptions) -> Self {
                Self { client, opts }
            }

            /// Layer `opts` over the options used for calls through this value.
            pub fn with_options(mut self, opts: ipfs_http_common::CallOptions) -> Self {
                self.opts = opts.merged_over(&self.opts);
                self
            }

            fn call(&self, request: ipfs_http_common::ApiRequest) -> crate::client::Call<'a, C> {
                crate::client::Call::new(self.client, request, self.opts.clone())
            }
        }

        impl<C: Connector> std::fmt::Debug for $name<'_, C> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("opts", &self.opts)
                    .finish_non_exhaustive()
            }
        }
    };
}

pub mod bitswap;
pub mod block;
pub mod bootstrap;
pub mod config;
pub mod dht;
pub mod files;
pub mod key;
pub mod name;
pub mod object;
pub mod pin;
pub mod pubsub;
pub mod repo;
pub mod swarm;
pub mod unstable;

pub use bitswap::BitswapApi;
pub use block::BlockApi;
pub use bootstrap::BootstrapApi;
pub use config::ConfigApi;
pub use dht::DhtApi;
pub use files::FilesApi;
pub use key::KeyApi;
pub use name::NameApi;
pub use object::{ObjectApi, ObjectPatchApi};
pub use pin::PinApi;
pub use pubsub::PubsubApi;
pub use repo::RepoApi;
pub use swarm::{SwarmApi, SwarmFiltersApi};
pub use unstable::{LogApi, UnstableApi};

impl<C: Connector> Client<C> {
    /// `bitswap/*`: block exchange state.
    pub fn bitswap(&self) -> BitswapApi<'_, C> {
        BitswapApi::from_parts(self, self.defaults().clone())
    }

    /// `block/*`: raw blocks.
    pub fn block(&self) -> BlockApi<'_, C> {
        BlockApi::from_parts(self, self.defaults().clone())
    }

    /// `bootstrap/*`: the bootstrap peer list.
    pub fn bootstrap(&self) -> BootstrapApi<'_, C> {
        BootstrapApi::from_parts(self, self.defaults().clone())
    }

    /// `config/*`: the daemon configuration.
    pub fn config(&self) -> ConfigApi<'_, C> {
        ConfigApi::from_parts(self, self.defaults().clone())
    }

    /// `dht/*`: the distributed hash table.
    pub fn dht(&self) -> DhtApi<'_, C> {
        DhtApi::from_parts(self, self.defaults().clone())
    }

    /// `files/*`: the mutable file system.
    pub fn files(&self) -> FilesApi<'_, C> {
        FilesApi::from_parts(self, self.defaults().clone())
    }

    /// `key/*`: the keystore.
    pub fn key(&self) -> KeyApi<'_, C> {
        KeyApi::from_parts(self, self.defaults().clone())
    }

    /// `name/*`: IPNS.
    pub fn name(&self) -> NameApi<'_, C> {
        NameApi::from_parts(self, self.defaults().clone())
    }

    /// `object/*`: low-level DAG nodes.
    pub fn object(&self) -> ObjectApi<'_, C> {
        ObjectApi::from_parts(self, self.defaults().clone())
    }

    /// `pin/*`: pinning.
    pub fn pin(&self) -> PinApi<'_, C> {
        PinApi::from_parts(self, self.defaults().clone())
    }

    /// `pubsub/*`: publish/subscribe messaging.
    pub fn pubsub(&self) -> PubsubApi<'_, C> {
        PubsubApi::from_parts(self, self.defaults().clone())
    }

    /// `repo/*`: the local repository.
    pub fn repo(&self) -> RepoApi<'_, C> {
        RepoApi::from_parts(self, self.defaults().clone())
    }

    /// `swarm/*`: peer connections.
    pub fn swarm(&self) -> SwarmApi<'_, C> {
        SwarmApi::from_parts(self, self.defaults().clone())
    }

    /// Calls whose shape still changes between daemon releases: `log/*`
    /// and `refs`.
    pub fn unstable(&self) -> UnstableApi<'_, C> {
        UnstableApi::from_parts(self, self.defaults().clone())
    }
}
