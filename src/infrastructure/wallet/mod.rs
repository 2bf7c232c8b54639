//! Wallet connector
//!
//! Requests account access from the configured provider and hands back a
//! signer bound to the first authorized account.

mod error;

use std::sync::Arc;
use std::time::Duration;

use alloy::network::ReceiptResponse as _;
use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::contract::PreparedCall;
use crate::infrastructure::ethereum::{
    create_provider, create_signing_provider, EthereumProvider, ProviderConfig,
};

pub use error::WalletError;

/// An authorized account able to query and submit calls
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn account(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Short description of the endpoint, shown after connecting
    fn label(&self) -> String;

    async fn query(&self, call: &PreparedCall) -> Result<Bytes, WalletError>;

    async fn submit(&self, call: &PreparedCall) -> Result<B256, WalletError>;

    /// Wait for the receipt of `hash`. Returns the block it was included in.
    async fn wait_confirmed(&self, hash: B256) -> Result<Option<u64>, WalletError>;
}

#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn WalletSigner>, WalletError>;
}

/// Receipt polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(900),
        }
    }
}

/// Connects through a JSON-RPC endpoint, optionally signing with a local key
pub struct RpcWalletConnector {
    endpoint: Option<ProviderConfig>,
    private_key: Option<String>,
    receipts: ReceiptPolicy,
}

impl RpcWalletConnector {
    pub fn new(
        endpoint: Option<ProviderConfig>,
        private_key: Option<String>,
        receipts: ReceiptPolicy,
    ) -> Self {
        Self {
            endpoint,
            private_key: private_key.filter(|key| !key.trim().is_empty()),
            receipts,
        }
    }
}

#[async_trait]
impl WalletConnector for RpcWalletConnector {
    async fn connect(&self) -> Result<Arc<dyn WalletSigner>, WalletError> {
        let config = self.endpoint.clone().ok_or(WalletError::NoProvider)?;
        let provider = match &self.private_key {
            Some(key) => create_signing_provider(config, key).await,
            None => create_provider(config).await,
        }
        .map_err(|err| WalletError::from_provider(&err))?;

        let accounts = provider
            .request_accounts()
            .await
            .map_err(|err| WalletError::from_provider(&err))?;
        let account = accounts.first().copied().ok_or(WalletError::NoAccount)?;
        let chain_id = provider
            .chain_id()
            .await
            .map_err(|err| WalletError::from_provider(&err))?;
        let client = provider
            .client_version()
            .await
            .unwrap_or_else(|_| "unknown client".to_string());

        tracing::info!(
            endpoint = %provider.endpoint_name(),
            %account,
            chain_id,
            %client,
            "wallet connected"
        );

        Ok(Arc::new(ProviderSigner {
            provider,
            account,
            chain_id,
            client,
            receipts: self.receipts,
        }))
    }
}

struct ProviderSigner {
    provider: Box<dyn EthereumProvider>,
    account: Address,
    chain_id: u64,
    client: String,
    receipts: ReceiptPolicy,
}

impl ProviderSigner {
    fn request(&self, call: &PreparedCall) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .from(self.account)
            .to(call.to)
            .input(TransactionInput::new(call.calldata.clone()));
        if !call.value.is_zero() {
            request = request.value(call.value);
        }
        request
    }
}

#[async_trait]
impl WalletSigner for ProviderSigner {
    fn account(&self) -> Address {
        self.account
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.provider.endpoint_name(), self.client)
    }

    async fn query(&self, call: &PreparedCall) -> Result<Bytes, WalletError> {
        self.provider
            .call(self.request(call))
            .await
            .map_err(|err| WalletError::from_provider(&err))
    }

    async fn submit(&self, call: &PreparedCall) -> Result<B256, WalletError> {
        self.provider
            .send_transaction(self.request(call))
            .await
            .map_err(|err| WalletError::from_provider(&err))
    }

    async fn wait_confirmed(&self, hash: B256) -> Result<Option<u64>, WalletError> {
        let deadline = Instant::now() + self.receipts.timeout;
        loop {
            match self.provider.get_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if !receipt.status() {
                        return Err(WalletError::Reverted {
                            hash: format!("{hash:#x}"),
                        });
                    }
                    return Ok(receipt.block_number);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(%hash, error = %err, "receipt poll failed");
                }
            }
            if Instant::now() >= deadline {
                return Err(WalletError::Timeout {
                    hash: format!("{hash:#x}"),
                    secs: self.receipts.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.receipts.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_endpoint() {
        let connector = RpcWalletConnector::new(None, None, ReceiptPolicy::default());
        match connector.connect().await {
            Err(err) => assert_eq!(err, WalletError::NoProvider),
            Ok(_) => panic!("connected without an endpoint"),
        }
    }

    #[tokio::test]
    async fn test_connect_with_bad_key() {
        let connector = RpcWalletConnector::new(
            Some(ProviderConfig::Http("http://127.0.0.1:1".into())),
            Some("not-a-key".into()),
            ReceiptPolicy::default(),
        );
        match connector.connect().await {
            Err(WalletError::Rpc(message)) => assert!(message.contains("Invalid private key")),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("connected with an invalid key"),
        }
    }

    #[test]
    fn test_blank_private_key_is_ignored() {
        let connector = RpcWalletConnector::new(None, Some("  ".into()), ReceiptPolicy::default());
        assert!(connector.private_key.is_none());
    }
}
