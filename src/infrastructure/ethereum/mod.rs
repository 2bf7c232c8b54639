//! Ethereum infrastructure - Alloy provider implementations

mod provider;

pub use provider::{
    create_provider, create_signing_provider, is_user_rejection, EthereumProvider,
    ProviderConfig, USER_REJECTED_CODE,
};
