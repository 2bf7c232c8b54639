//! Domain layer - pure models with no I/O
//!
//! Interface descriptions and their partitions, networks, per-entry forms,
//! contract bindings and the pending transaction list.

pub mod abi;
pub mod contract;
pub mod form;
pub mod network;
pub mod pending;
