//! Decoding and formatting of read-call return data

use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{Context, Result};

use super::InterfaceEntry;

/// A decoded return value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOutput {
    /// Output name (or "arg{n}" if unnamed)
    pub name: String,
    /// Solidity type
    pub kind: String,
    /// Formatted value
    pub value: String,
}

/// Decode `data` with the output types of `entry`
pub fn decode_outputs(entry: &InterfaceEntry, data: &[u8]) -> Result<Vec<DecodedOutput>> {
    if entry.outputs.is_empty() {
        return Ok(Vec::new());
    }
    if data.is_empty() {
        anyhow::bail!("call returned no data (is this a contract on the selected network?)");
    }

    let types = entry
        .outputs
        .iter()
        .map(|param| {
            DynSolType::parse(&param.canonical)
                .with_context(|| format!("Failed to parse type '{}'", param.canonical))
        })
        .collect::<Result<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .context("Failed to decode return data")?;
    let values = match decoded {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    };

    Ok(entry
        .outputs
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(idx, (param, value))| DecodedOutput {
            name: param.label(idx),
            kind: param.ty.clone(),
            value: format_sol_value(value),
        })
        .collect())
}

/// Format a DynSolValue for display
pub fn format_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let items: Vec<String> = arr.iter().map(format_sol_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_sol_value).collect();
            format!("({})", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::Interface;
    use alloy_primitives::U256;

    fn entry(raw: &str) -> InterfaceEntry {
        Interface::parse(raw).entries()[0].clone()
    }

    #[test]
    fn test_decode_uint() {
        let entry = entry(
            r#"[{"type":"function","name":"totalSupply","stateMutability":"view",
                "inputs":[],"outputs":[{"name":"","type":"uint256"}]}]"#,
        );
        let data = DynSolValue::Uint(U256::from(1_000u64), 256).abi_encode();
        let outputs = decode_outputs(&entry, &data).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "arg0");
        assert_eq!(outputs[0].value, "1000");
    }

    #[test]
    fn test_decode_string_and_bool() {
        let entry = entry(
            r#"[{"type":"function","name":"info","stateMutability":"view","inputs":[],
                "outputs":[{"name":"label","type":"string"},{"name":"paused","type":"bool"}]}]"#,
        );
        let data = DynSolValue::Tuple(vec![
            DynSolValue::String("vault".into()),
            DynSolValue::Bool(true),
        ])
        .abi_encode_params();
        let outputs = decode_outputs(&entry, &data).unwrap();
        assert_eq!(outputs[0].value, "\"vault\"");
        assert_eq!(outputs[1].name, "paused");
        assert_eq!(outputs[1].value, "true");
    }

    #[test]
    fn test_empty_return_data_is_an_error() {
        let entry = entry(
            r#"[{"type":"function","name":"owner","stateMutability":"view",
                "inputs":[],"outputs":[{"name":"","type":"address"}]}]"#,
        );
        assert!(decode_outputs(&entry, &[]).is_err());
    }
}
