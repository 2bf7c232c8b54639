//! Callpad: look up a contract's interface and call it from the terminal.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod modules;
pub mod store;
pub mod ui;
