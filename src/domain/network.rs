//! Networks the resolver can look contracts up on

use serde::{Deserialize, Serialize};

/// A chain with a block explorer and an explorer API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
    /// Explorer origin used for links, e.g. "https://etherscan.io"
    pub explorer: String,
    /// Etherscan-compatible API endpoint
    pub api_url: String,
}

impl Network {
    fn new(name: &str, chain_id: u64, explorer: &str, api_url: &str) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            explorer: explorer.to_string(),
            api_url: api_url.to_string(),
        }
    }

    /// `{origin}/tx/{hash}`
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer.trim_end_matches('/'), hash)
    }

    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer.trim_end_matches('/'), address)
    }
}

/// Networks known without any configuration
pub fn builtin_networks() -> Vec<Network> {
    vec![
        Network::new("mainnet", 1, "https://etherscan.io", "https://api.etherscan.io/api"),
        Network::new(
            "sepolia",
            11_155_111,
            "https://sepolia.etherscan.io",
            "https://api-sepolia.etherscan.io/api",
        ),
        Network::new(
            "holesky",
            17_000,
            "https://holesky.etherscan.io",
            "https://api-holesky.etherscan.io/api",
        ),
        Network::new(
            "optimism",
            10,
            "https://optimistic.etherscan.io",
            "https://api-optimistic.etherscan.io/api",
        ),
        Network::new("arbitrum", 42_161, "https://arbiscan.io", "https://api.arbiscan.io/api"),
        Network::new("base", 8_453, "https://basescan.org", "https://api.basescan.org/api"),
        Network::new("polygon", 137, "https://polygonscan.com", "https://api.polygonscan.com/api"),
        Network::new("bsc", 56, "https://bscscan.com", "https://api.bscscan.com/api"),
        Network::new(
            "bsc-testnet",
            97,
            "https://testnet.bscscan.com",
            "https://api-testnet.bscscan.com/api",
        ),
    ]
}

/// Look a network up by name (case-insensitive), alias or chain id
pub fn find_network<'a>(networks: &'a [Network], query: &str) -> Option<&'a Network> {
    let query = query.trim().to_lowercase();
    let canonical = match query.as_str() {
        "eth" | "ethereum" | "homestead" => "mainnet",
        "op" => "optimism",
        "arb" | "arbitrum-one" => "arbitrum",
        "matic" => "polygon",
        "bnb" => "bsc",
        other => other,
    };
    networks
        .iter()
        .find(|network| network.name.eq_ignore_ascii_case(canonical))
        .or_else(|| {
            let chain_id = canonical.parse::<u64>().ok()?;
            networks.iter().find(|network| network.chain_id == chain_id)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_url() {
        let networks = builtin_networks();
        let mainnet = find_network(&networks, "mainnet").unwrap();
        assert_eq!(mainnet.tx_url("0xabc"), "https://etherscan.io/tx/0xabc");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let network = Network::new("dev", 31337, "http://localhost:5100/", "");
        assert_eq!(network.tx_url("0x1"), "http://localhost:5100/tx/0x1");
    }

    #[test]
    fn test_find_by_alias_and_chain_id() {
        let networks = builtin_networks();
        assert_eq!(find_network(&networks, "ETH").unwrap().chain_id, 1);
        assert_eq!(find_network(&networks, "8453").unwrap().name, "base");
        assert!(find_network(&networks, "atlantis").is_none());
    }
}
