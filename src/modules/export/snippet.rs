//! Code snippet for the Code tab
//!
//! Static templating over the visible entries: an ethers.js setup followed by
//! one `cast` line per entry.

use crate::domain::abi::{InterfaceEntry, StateMutability};
use crate::domain::network::Network;

/// Render the snippet for `address` on `network`
pub fn render_snippet(network: &Network, address: &str, entries: &[&InterfaceEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// {} (chain {}) {}\n",
        network.name,
        network.chain_id,
        network.address_url(address)
    ));
    out.push_str("import { ethers } from \"ethers\";\n\n");
    out.push_str(&format!("const address = \"{address}\";\n"));
    out.push_str("const abi = [\n");
    for entry in entries {
        out.push_str(&format!("  \"{}\",\n", human_readable(entry)));
    }
    out.push_str("];\n\n");
    out.push_str("const provider = new ethers.BrowserProvider(window.ethereum);\n");
    out.push_str("const signer = await provider.getSigner();\n");
    out.push_str("const contract = new ethers.Contract(address, abi, signer);\n");

    if !entries.is_empty() {
        out.push_str("\n# cast\n");
        for entry in entries {
            out.push_str(&cast_line(address, entry));
            out.push('\n');
        }
    }
    out
}

/// Human-readable ABI fragment, e.g.
/// `function transfer(address to, uint256 amount) returns (bool)`
pub fn human_readable(entry: &InterfaceEntry) -> String {
    let inputs: Vec<String> = entry
        .inputs
        .iter()
        .map(|param| {
            if param.name.is_empty() {
                param.canonical.clone()
            } else {
                format!("{} {}", param.canonical, param.name)
            }
        })
        .collect();

    let mut fragment = format!("function {}({})", entry.name, inputs.join(", "));
    match entry.state_mutability {
        StateMutability::View | StateMutability::Pure | StateMutability::Payable => {
            fragment.push(' ');
            fragment.push_str(entry.state_mutability.as_str());
        }
        StateMutability::NonPayable => {}
    }
    if !entry.outputs.is_empty() {
        let outputs: Vec<&str> = entry.outputs.iter().map(|p| p.canonical.as_str()).collect();
        fragment.push_str(&format!(" returns ({})", outputs.join(", ")));
    }
    fragment
}

fn cast_line(address: &str, entry: &InterfaceEntry) -> String {
    let placeholders: Vec<String> = entry
        .inputs
        .iter()
        .enumerate()
        .map(|(index, param)| format!("<{}>", param.label(index)))
        .collect();
    let args = if placeholders.is_empty() {
        String::new()
    } else {
        format!(" {}", placeholders.join(" "))
    };

    if entry.state_mutability.is_read_only() {
        let signature = if entry.outputs.is_empty() {
            entry.signature.clone()
        } else {
            format!("{}{}", entry.signature, entry.returns_signature())
        };
        format!("cast call {address} \"{signature}\"{args} --rpc-url $ETH_RPC_URL")
    } else {
        let value = if entry.is_payable() {
            " --value <wei>"
        } else {
            ""
        };
        format!(
            "cast send {address} \"{}\"{args}{value} --rpc-url $ETH_RPC_URL",
            entry.signature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::Interface;
    use crate::domain::network::{builtin_networks, find_network};

    const ABI: &str = r#"[
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"deposit","stateMutability":"payable","inputs":[],"outputs":[]}
    ]"#;

    #[test]
    fn test_human_readable_fragments() {
        let interface = Interface::parse(ABI);
        let entries = interface.entries();
        assert_eq!(
            human_readable(&entries[0]),
            "function balanceOf(address owner) view returns (uint256)"
        );
        assert_eq!(
            human_readable(&entries[1]),
            "function transfer(address to, uint256) returns (bool)"
        );
        assert_eq!(human_readable(&entries[2]), "function deposit() payable");
    }

    #[test]
    fn test_snippet_lists_cast_lines() {
        let interface = Interface::parse(ABI);
        let entries: Vec<&InterfaceEntry> = interface.entries().iter().collect();
        let networks = builtin_networks();
        let network = find_network(&networks, "mainnet").unwrap();
        let snippet = render_snippet(network, "0xabc", &entries);

        assert!(snippet.contains("const address = \"0xabc\";"));
        assert!(snippet.contains(
            "cast call 0xabc \"balanceOf(address)(uint256)\" <owner> --rpc-url $ETH_RPC_URL"
        ));
        assert!(snippet.contains(
            "cast send 0xabc \"transfer(address,uint256)\" <to> <arg1> --rpc-url $ETH_RPC_URL"
        ));
        assert!(snippet.contains("cast send 0xabc \"deposit()\" --value <wei>"));
    }

    #[test]
    fn test_snippet_without_entries() {
        let networks = builtin_networks();
        let snippet = render_snippet(&networks[0], "0xabc", &[]);
        assert!(snippet.contains("const abi = [\n];"));
        assert!(!snippet.contains("# cast"));
    }
}
