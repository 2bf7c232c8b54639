//! JSON Export
//!
//! Writes the loaded interface description to JSON files.

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct ExportableInterface<'a> {
    network: &'a str,
    address: &'a str,
    entries: usize,
    abi: serde_json::Value,
}

/// Write the raw description (pretty-printed) with its address and network
pub fn write_abi(
    path: &Path,
    network: &str,
    address: &str,
    raw_abi: &str,
    entries: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let abi = serde_json::from_str(raw_abi)
        .unwrap_or_else(|_| serde_json::Value::String(raw_abi.to_string()));
    let export = ExportableInterface {
        network,
        address,
        entries,
        abi,
    };

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_abi() {
        let mut path = std::env::temp_dir();
        path.push(format!("callpad_abi_{}.json", std::process::id()));
        let count = write_abi(&path, "mainnet", "0xabc", r#"[{"type":"function","name":"a"}]"#, 1)
            .unwrap();
        assert_eq!(count, 1);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["network"], "mainnet");
        assert_eq!(written["abi"][0]["name"], "a");
        std::fs::remove_file(path).ok();
    }
}
