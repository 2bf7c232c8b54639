//! Contract binding for a connected wallet session

use alloy_primitives::{Address, Bytes, U256};

use super::abi::{encode_call, CoercedArg, InterfaceEntry, ValidationError};

/// Calldata ready to hand to a signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub to: Address,
    pub calldata: Bytes,
    /// Wei attached to payable calls
    pub value: U256,
    /// Signature of the entry being called, for logs and messages
    pub signature: String,
}

/// A contract bound to an (address, interface list, account) triple.
///
/// The binding is only valid for the triple it was built from; the app drops
/// it whenever the address or the displayed interface list changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundContract {
    address: Address,
    interface_generation: u64,
    account: Address,
}

impl BoundContract {
    pub fn bind(address: Address, interface_generation: u64, account: Address) -> Self {
        Self {
            address,
            interface_generation,
            account,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn is_bound_to(&self, address: Address, interface_generation: u64) -> bool {
        self.address == address && self.interface_generation == interface_generation
    }

    /// Encode a call to `entry` against this contract
    pub fn prepare(
        &self,
        entry: &InterfaceEntry,
        args: &[CoercedArg],
        value: U256,
    ) -> Result<PreparedCall, ValidationError> {
        let calldata = encode_call(entry, args)?;
        Ok(PreparedCall {
            to: self.address,
            calldata: calldata.into(),
            value,
            signature: entry.signature.clone(),
        })
    }
}

/// A successful wallet connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    /// Identifies the signer held by the runtime worker
    pub session_id: u64,
    pub account: Address,
    pub chain_id: u64,
    pub contract: BoundContract,
}

/// Parse a hex address, accepting any checksum casing
pub fn parse_address(value: &str) -> Option<Address> {
    let trimmed = value.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    if payload.len() != 40 {
        return None;
    }
    let bytes = hex::decode(payload).ok()?;
    Some(Address::from_slice(&bytes))
}
