//! UI Modules
//!
//! Feature code that works on app state and reports back through an Action:
//! - export: code snippet, transaction CSV and ABI JSON export, clipboard
pub mod export;
