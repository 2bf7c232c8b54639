use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::network::{builtin_networks, Network};

pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1000;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 900;

/// A `[[networks]]` table entry. Unset fields inherit from the built-in
/// network of the same name.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub chain_id: Option<u64>,
    pub explorer: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_network: Option<String>,

    /// Wallet provider endpoints; the first one set wins (ipc, ws, rpc)
    #[serde(default)]
    pub rpc: Option<String>,
    #[serde(default)]
    pub ws: Option<String>,
    #[serde(default)]
    pub ipc: Option<String>,

    /// Proxy endpoint answering `?address=&network=`
    #[serde(default)]
    pub lookup_url: Option<String>,

    #[serde(default)]
    pub etherscan_api_key: Option<String>,

    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    #[serde(default = "default_cache")]
    pub cache: bool,

    #[serde(default)]
    pub networks: Vec<NetworkSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_network: None,
            rpc: None,
            ws: None,
            ipc: None,
            lookup_url: None,
            etherscan_api_key: None,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            cache: true,
            networks: Vec::new(),
        }
    }
}

fn default_receipt_poll_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_MS
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

fn default_cache() -> bool {
    true
}

impl Config {
    /// Parse a config file body. Invalid TOML yields the defaults.
    pub fn from_toml(content: &str) -> Self {
        match toml::from_str::<Config>(content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid config file");
                Config::default()
            }
        }
    }

    /// Built-in networks with `[[networks]]` overrides and additions applied
    pub fn networks(&self) -> Vec<Network> {
        let mut networks = builtin_networks();
        for spec in &self.networks {
            let name = spec.name.trim();
            if name.is_empty() {
                continue;
            }
            match networks
                .iter_mut()
                .find(|network| network.name.eq_ignore_ascii_case(name))
            {
                Some(existing) => {
                    if let Some(chain_id) = spec.chain_id {
                        existing.chain_id = chain_id;
                    }
                    if let Some(explorer) = &spec.explorer {
                        existing.explorer = explorer.clone();
                    }
                    if let Some(api_url) = &spec.api_url {
                        existing.api_url = api_url.clone();
                    }
                }
                None => networks.push(Network {
                    name: name.to_string(),
                    chain_id: spec.chain_id.unwrap_or_default(),
                    explorer: spec.explorer.clone().unwrap_or_default(),
                    api_url: spec.api_url.clone().unwrap_or_default(),
                }),
            }
        }
        networks
    }

    pub fn default_network_name(&self) -> &str {
        self.default_network
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_NETWORK)
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    Config::from_toml(&content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CALLPAD_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("callpad").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("callpad").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "callpad", "callpad")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("callpad"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("callpad"));
    }
    directories::ProjectDirs::from("io", "callpad", "callpad")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn abi_cache_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("abi_cache.sqlite3"))
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("callpad.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("");
        assert_eq!(config.receipt_poll_ms, 1000);
        assert_eq!(config.receipt_timeout_secs, 900);
        assert!(config.cache);
        assert_eq!(config.default_network_name(), "mainnet");
        assert_eq!(config.networks().len(), builtin_networks().len());
    }

    #[test]
    fn test_invalid_toml_yields_defaults() {
        let config = Config::from_toml("rpc = [");
        assert!(config.rpc.is_none());
        assert!(config.cache);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
            default_network = "sepolia"
            rpc = "http://localhost:8545"
            lookup_url = "http://localhost:3000/api/getAbi"
            receipt_poll_ms = 250
            cache = false

            [[networks]]
            name = "mainnet"
            explorer = "https://eth.blockscout.com"

            [[networks]]
            name = "anvil"
            chain_id = 31337
            explorer = "http://localhost:5100"
            api_url = "http://localhost:5100/api"
            "#,
        );
        assert_eq!(config.default_network_name(), "sepolia");
        assert_eq!(config.rpc.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.receipt_poll_ms, 250);
        assert_eq!(config.receipt_timeout_secs, 900);
        assert!(!config.cache);

        let networks = config.networks();
        let mainnet = networks.iter().find(|n| n.name == "mainnet").unwrap();
        assert_eq!(mainnet.explorer, "https://eth.blockscout.com");
        assert_eq!(mainnet.chain_id, 1);
        let anvil = networks.iter().find(|n| n.name == "anvil").unwrap();
        assert_eq!(anvil.chain_id, 31337);
        assert_eq!(anvil.tx_url("0x1"), "http://localhost:5100/tx/0x1");
    }
}
