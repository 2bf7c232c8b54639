//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based Ethereum provider implementations
//! - Interface lookup against explorer APIs
//! - The wallet connector and signer
//! - Tokio runtime bridge for async operations

pub mod ethereum;
pub mod lookup;
pub mod runtime;
pub mod wallet;
