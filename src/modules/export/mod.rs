//! Export Module
//!
//! Code snippet, transaction and ABI export.
//!
//! - 'y' copies the Code tab snippet to the clipboard
//! - 'x' / `:export` writes the snippet to a file
//! - `:export txs` → CSV of every tracked transaction
//! - `:export abi` → JSON of the loaded interface description
//! - Files saved to the data directory under exports/

mod csv_export;
mod json_export;
pub mod snippet;

use crate::app::App;
use crate::core::{Action, NotifyLevel};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub use snippet::render_snippet;

/// Get the export directory path, creating it if needed
fn get_export_dir() -> std::io::Result<PathBuf> {
    let export_dir = crate::config::data_dir()
        .map(|dir| dir.join("exports"))
        .unwrap_or_else(|| PathBuf::from(".callpad").join("exports"));
    fs::create_dir_all(&export_dir)?;
    Ok(export_dir)
}

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

fn export_path(prefix: &str, extension: &str) -> Result<PathBuf, Action> {
    let export_dir = get_export_dir().map_err(|e| {
        Action::Notify(
            format!("Failed to create export directory: {}", e),
            NotifyLevel::Error,
        )
    })?;
    Ok(export_dir.join(generate_filename(prefix, extension)))
}

/// Write the Code tab snippet to a file
pub fn export_snippet(app: &App) -> Action {
    let Some(snippet) = app.snippet() else {
        return Action::Notify("No contract loaded".to_string(), NotifyLevel::Warn);
    };
    let path = match export_path("snippet", "js") {
        Ok(path) => path,
        Err(action) => return action,
    };
    match write_text(&path, &snippet) {
        Ok(()) => Action::Notify(
            format!("Exported snippet to {}", path.display()),
            NotifyLevel::Info,
        ),
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}

/// Write every transaction submitted this session to CSV
pub fn export_transactions(app: &App) -> Action {
    if app.tx_log.is_empty() {
        return Action::Notify("No transactions to export".to_string(), NotifyLevel::Warn);
    }
    let path = match export_path("transactions", "csv") {
        Ok(path) => path,
        Err(action) => return action,
    };
    match csv_export::write_transactions(&path, &app.tx_log) {
        Ok(count) => Action::Notify(
            format!("Exported {} txs to {}", count, path.display()),
            NotifyLevel::Info,
        ),
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}

/// Write the loaded interface description to JSON
pub fn export_abi(app: &App) -> Action {
    let Some(contract) = app.contract.as_ref() else {
        return Action::Notify("No contract loaded".to_string(), NotifyLevel::Warn);
    };
    let path = match export_path("abi", "json") {
        Ok(path) => path,
        Err(action) => return action,
    };
    let address = contract.address.to_checksum(None);
    match json_export::write_abi(
        &path,
        &contract.network.name,
        &address,
        contract.interface.raw(),
        contract.interface.len(),
    ) {
        Ok(count) => Action::Notify(
            format!("Exported {} entries to {}", count, path.display()),
            NotifyLevel::Info,
        ),
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}

/// Ask the app to copy the snippet
pub fn copy_snippet(app: &App) -> Action {
    match app.snippet() {
        Some(snippet) => Action::Copy(snippet),
        None => Action::Notify("No contract loaded".to_string(), NotifyLevel::Warn),
    }
}

/// Put `text` on the system clipboard
pub fn copy_to_clipboard(text: &str) -> Action {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    match result {
        Ok(()) => Action::Notify(
            format!("Copied {} lines to clipboard", text.lines().count()),
            NotifyLevel::Info,
        ),
        Err(e) => Action::Notify(format!("Clipboard unavailable: {}", e), NotifyLevel::Error),
    }
}

fn write_text(path: &Path, text: &str) -> std::io::Result<()> {
    fs::write(path, text)
}
