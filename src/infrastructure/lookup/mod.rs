//! Interface description lookup
//!
//! One HTTP request per lookup, either to a proxy endpoint or straight to the
//! network's Etherscan-compatible API, with an optional SQLite cache in front.

mod cached;
mod resolver;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::network::Network;

pub use cached::CachedInterfaceSource;
pub use resolver::{parse_lookup_response, ExplorerResolver, LookupMode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The endpoint answered with a status other than "1"
    #[error("{0}")]
    Rejected(String),
    #[error("lookup request failed: {0}")]
    Http(String),
    #[error("malformed lookup response: {0}")]
    Malformed(String),
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),
}

/// A fetched description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedInterface {
    pub abi_json: String,
    pub from_cache: bool,
}

#[async_trait]
pub trait InterfaceSource: Send + Sync {
    /// Fetch the description for `address`. `refresh` skips any cache.
    async fn fetch(
        &self,
        network: &Network,
        address: &str,
        refresh: bool,
    ) -> Result<FetchedInterface, LookupError>;
}
