//! Ethereum provider abstraction and Alloy implementations
//!
//! The provider plays the part of the wallet: it authorizes accounts, answers
//! `eth_call`, submits transactions and reports receipts.

use std::path::PathBuf;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    DynProvider, Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportResult;
use anyhow::{Context, Result};

/// EIP-1193 "user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Abstract Ethereum provider trait
///
/// Everything the wallet connector needs, abstracting over the specific
/// Alloy transport.
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Chain id reported by the endpoint
    async fn chain_id(&self) -> Result<u64>;

    /// Get client version (for the connection message)
    async fn client_version(&self) -> Result<String>;

    /// Ask the endpoint for account access.
    ///
    /// Tries `eth_requestAccounts` first and falls back to `eth_accounts`
    /// unless the user explicitly rejected the request.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Execute a call (eth_call)
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Submit a transaction and return its hash
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Get transaction receipt
    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

// Type aliases for the filled providers
type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

type WsFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

#[cfg(unix)]
type IpcFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Enum-based provider that stores concrete types for each transport.
///
/// The `Local` variant signs in-process with a private key; the others leave
/// signing to the endpoint via `eth_sendTransaction`.
pub enum AlloyProvider {
    Http {
        provider: HttpFillProvider,
        endpoint: String,
    },
    WebSocket {
        provider: WsFillProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: IpcFillProvider,
        endpoint: String,
    },
    Local {
        provider: DynProvider,
        signer: Address,
        endpoint: String,
    },
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn EthereumProvider>> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyProvider::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyProvider::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc_path = path.to_string_lossy().to_string();
            let ipc = IpcConnect::new(ipc_path);
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            let display = path.display().to_string();
            Ok(Box::new(AlloyProvider::Ipc {
                provider,
                endpoint: display,
            }))
        }
    }
}

/// Create a provider that signs locally with `private_key`
pub async fn create_signing_provider(
    config: ProviderConfig,
    private_key: &str,
) -> Result<Box<dyn EthereumProvider>> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .context("Invalid private key")?;
    let address = signer.address();
    let endpoint = config.display();
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect(&endpoint)
        .await
        .with_context(|| format!("Failed to connect signing provider to {endpoint}"))?
        .erased();
    Ok(Box::new(AlloyProvider::Local {
        provider,
        signer: address,
        endpoint,
    }))
}

// Macro to reduce code duplication for provider method implementations
macro_rules! impl_provider_method {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            AlloyProvider::Http { provider, .. } => provider.$method($($arg),*).await,
            AlloyProvider::WebSocket { provider, .. } => provider.$method($($arg),*).await,
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => provider.$method($($arg),*).await,
            AlloyProvider::Local { provider, .. } => provider.$method($($arg),*).await,
        }
    };
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn chain_id(&self) -> Result<u64> {
        Ok(impl_provider_method!(self, get_chain_id)?)
    }

    async fn client_version(&self) -> Result<String> {
        Ok(impl_provider_method!(self, get_client_version)?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if let AlloyProvider::Local { signer, .. } = self {
            return Ok(vec![*signer]);
        }

        let requested: TransportResult<Vec<Address>> =
            impl_provider_method!(self, raw_request, "eth_requestAccounts".into(), ());
        match requested {
            Ok(accounts) => Ok(accounts),
            Err(err) if is_user_rejection(&err) => Err(err.into()),
            Err(err) => {
                tracing::debug!(error = %err, "eth_requestAccounts unsupported, using eth_accounts");
                Ok(impl_provider_method!(self, get_accounts)?)
            }
        }
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        Ok(impl_provider_method!(self, call, request.clone())?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = impl_provider_method!(self, send_transaction, request.clone())?;
        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        Ok(impl_provider_method!(self, get_transaction_receipt, hash)?)
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyProvider::Http { endpoint, .. } => endpoint.clone(),
            AlloyProvider::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyProvider::Ipc { endpoint, .. } => endpoint.clone(),
            AlloyProvider::Local { endpoint, .. } => endpoint.clone(),
        }
    }
}

/// True when the endpoint answered with the EIP-1193 rejection code
pub fn is_user_rejection(err: &alloy::transports::TransportError) -> bool {
    err.as_error_resp()
        .is_some_and(|payload| payload.code == USER_REJECTED_CODE)
}
