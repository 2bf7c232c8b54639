//! CSV Export
//!
//! Writes the session's transactions to CSV files.

use crate::app::TxRecord;
use std::path::Path;

/// Write transactions to CSV file
pub fn write_transactions(
    path: &Path,
    txs: &[TxRecord],
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    // Write header
    wtr.write_record([
        "submitted_at",
        "network",
        "contract",
        "function",
        "hash",
        "status",
        "block_number",
        "failure",
        "explorer_url",
    ])?;

    // Write data rows
    for tx in txs {
        wtr.write_record([
            tx.submitted_at.to_rfc3339(),
            tx.network.clone(),
            tx.contract.clone(),
            tx.signature.clone(),
            tx.hash.clone(),
            tx.status_label().to_string(),
            tx.block_number.map(|n| n.to_string()).unwrap_or_default(),
            tx.failure.clone().unwrap_or_default(),
            tx.explorer_url.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(txs.len())
}
