use thiserror::Error;

use crate::infrastructure::ethereum::is_user_rejection;

/// Wallet connection and signing failures. None of these is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider configured (set --rpc, --ws or --ipc)")]
    NoProvider,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("wallet returned no authorized account")]
    NoAccount,
    #[error("wallet session closed, reconnect")]
    SessionClosed,
    #[error("{0}")]
    Rpc(String),
    #[error("transaction {hash} reverted")]
    Reverted { hash: String },
    #[error("transaction {hash} not confirmed after {secs}s")]
    Timeout { hash: String, secs: u64 },
}

impl WalletError {
    /// Classify a provider error, picking out explicit user rejections
    pub fn from_provider(err: &anyhow::Error) -> Self {
        let rejected = err.chain().any(|cause| {
            cause
                .downcast_ref::<alloy::transports::TransportError>()
                .is_some_and(is_user_rejection)
        });
        let message = format!("{err:#}");
        if rejected || looks_like_rejection(&message) {
            WalletError::Rejected(message)
        } else {
            WalletError::Rpc(message)
        }
    }
}

fn looks_like_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("user rejected") || lower.contains("user denied")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_by_message() {
        let err = anyhow::anyhow!("MetaMask Tx Signature: User denied transaction signature.");
        assert!(matches!(
            WalletError::from_provider(&err),
            WalletError::Rejected(_)
        ));
    }

    #[test]
    fn test_other_errors_are_rpc() {
        let err = anyhow::anyhow!("execution reverted: not owner").context("eth_call failed");
        match WalletError::from_provider(&err) {
            WalletError::Rpc(message) => {
                assert!(message.contains("eth_call failed"));
                assert!(message.contains("not owner"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            WalletError::Timeout {
                hash: "0xaa".into(),
                secs: 5
            }
            .to_string(),
            "transaction 0xaa not confirmed after 5s"
        );
        assert!(WalletError::NoProvider.to_string().starts_with("no wallet provider"));
    }
}
