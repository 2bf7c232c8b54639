//! Command parser for the : command system

/// What `:export` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// The code snippet of the Code tab
    Snippet,
    /// Every tracked transaction, as CSV
    Transactions,
    /// The loaded interface description, as JSON
    Abi,
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Contract selection
    Load {
        address: String,
        network: Option<String>,
    },
    Reload,
    Network(Option<String>),
    Open {
        path: String,
        address: Option<String>,
    },

    // Wallet
    Connect,

    // Export
    Export(ExportTarget),
    Copy,

    // UI
    Settings,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match cmd.to_lowercase().as_str() {
        "load" | "l" => match args.as_slice() {
            [address] => Command::Load {
                address: address.to_string(),
                network: None,
            },
            [address, network] => Command::Load {
                address: address.to_string(),
                network: Some(network.to_string()),
            },
            _ => Command::Unknown(input.to_string()),
        },
        "reload" | "r" => Command::Reload,
        "network" | "net" => match args.as_slice() {
            [] => Command::Network(None),
            [name] => Command::Network(Some(name.to_string())),
            _ => Command::Unknown(input.to_string()),
        },
        "open" | "o" => match args.as_slice() {
            [path] => Command::Open {
                path: path.to_string(),
                address: None,
            },
            [path, address] => Command::Open {
                path: path.to_string(),
                address: Some(address.to_string()),
            },
            _ => Command::Unknown(input.to_string()),
        },

        "connect" | "conn" => Command::Connect,

        "export" | "x" => match args.as_slice() {
            [] | ["code"] | ["snippet"] => Command::Export(ExportTarget::Snippet),
            ["txs"] | ["tx"] | ["transactions"] => Command::Export(ExportTarget::Transactions),
            ["abi"] => Command::Export(ExportTarget::Abi),
            _ => Command::Unknown(input.to_string()),
        },
        "copy" | "y" => Command::Copy,

        "settings" | "set" => Command::Settings,
        "help" | "h" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}
