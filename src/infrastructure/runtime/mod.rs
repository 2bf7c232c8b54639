//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod worker;

pub use bridge::{RuntimeBridge, RuntimeCommand, RuntimeEvent, RuntimeServices};
pub use worker::run_async_worker;
