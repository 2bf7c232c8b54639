//! Contract interface description model
//!
//! Entries are parsed leniently from JSON ABI values: anything that does not
//! look like an ABI item is skipped instead of failing the whole description.

use std::fmt;

use alloy_json_abi::{Function, Param as AbiParam};
use serde_json::Value;

/// Kind of an interface entry (the ABI `type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Function,
    Event,
    Constructor,
    Fallback,
    Receive,
    Error,
}

impl EntryKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "function" => Some(EntryKind::Function),
            "event" => Some(EntryKind::Event),
            "constructor" => Some(EntryKind::Constructor),
            "fallback" => Some(EntryKind::Fallback),
            "receive" => Some(EntryKind::Receive),
            "error" => Some(EntryKind::Error),
            _ => None,
        }
    }
}

/// State mutability of a callable entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Parse the `stateMutability` field, falling back to the legacy
    /// `constant` / `payable` flags used by pre-0.4.16 compilers.
    fn from_entry(entry: &Value) -> Self {
        match entry.get("stateMutability").and_then(Value::as_str) {
            Some("pure") => return StateMutability::Pure,
            Some("view") => return StateMutability::View,
            Some("payable") => return StateMutability::Payable,
            Some("nonpayable") => return StateMutability::NonPayable,
            _ => {}
        }
        if entry.get("constant").and_then(Value::as_bool) == Some(true) {
            StateMutability::View
        } else if entry.get("payable").and_then(Value::as_bool) == Some(true) {
            StateMutability::Payable
        } else {
            StateMutability::NonPayable
        }
    }

    /// view/pure entries never need a transaction
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    fn to_abi(self) -> alloy_json_abi::StateMutability {
        match self {
            StateMutability::Pure => alloy_json_abi::StateMutability::Pure,
            StateMutability::View => alloy_json_abi::StateMutability::View,
            StateMutability::NonPayable => alloy_json_abi::StateMutability::NonPayable,
            StateMutability::Payable => alloy_json_abi::StateMutability::Payable,
        }
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed input or output of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name (may be empty)
    pub name: String,
    /// Declared Solidity type, e.g. "uint256", "tuple[]"
    pub ty: String,
    /// Selector type with tuple components expanded, e.g. "(uint256,address)[]"
    pub canonical: String,
}

impl Param {
    /// Display name, `arg{index}` when the ABI leaves it empty
    pub fn label(&self, index: usize) -> String {
        if self.name.trim().is_empty() {
            format!("arg{index}")
        } else {
            self.name.clone()
        }
    }
}

/// One entry of an interface description
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceEntry {
    pub name: String,
    pub kind: EntryKind,
    pub state_mutability: StateMutability,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    /// Canonical signature, e.g. "transfer(address,uint256)"
    pub signature: String,
    /// 4-byte selector (zero for non-function entries)
    pub selector: [u8; 4],
    function: Option<Function>,
}

impl InterfaceEntry {
    /// Parse a single ABI item. Returns `None` for anything unrecognizable.
    pub fn from_value(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        // `type` defaults to "function" per the ABI specification
        let kind = match object.get("type") {
            None => EntryKind::Function,
            Some(value) => EntryKind::parse(value.as_str()?)?,
        };
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if kind == EntryKind::Function && name.is_empty() {
            return None;
        }
        let state_mutability = StateMutability::from_entry(entry);

        let abi_inputs = parse_params(object.get("inputs"))?;
        let abi_outputs = parse_params(object.get("outputs"))?;

        let function = Function {
            name: name.clone(),
            inputs: abi_inputs.clone(),
            outputs: abi_outputs.clone(),
            state_mutability: state_mutability.to_abi(),
        };
        let (signature, selector) = if kind == EntryKind::Function {
            (function.signature(), function.selector().0)
        } else {
            (function.signature(), [0u8; 4])
        };

        Some(Self {
            name,
            kind,
            state_mutability,
            inputs: abi_inputs.iter().map(to_param).collect(),
            outputs: abi_outputs.iter().map(to_param).collect(),
            signature,
            selector,
            function: (kind == EntryKind::Function).then_some(function),
        })
    }

    pub fn is_function(&self) -> bool {
        self.kind == EntryKind::Function
    }

    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    /// Output types as a tuple, e.g. "(uint256,bool)"
    pub fn returns_signature(&self) -> String {
        let types: Vec<&str> = self.outputs.iter().map(|p| p.canonical.as_str()).collect();
        format!("({})", types.join(","))
    }

    /// The alloy function this entry encodes with (functions only)
    pub fn abi_function(&self) -> Option<&Function> {
        self.function.as_ref()
    }
}

/// A parsed interface description, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Interface {
    entries: Vec<InterfaceEntry>,
    raw: String,
}

impl Interface {
    /// Parse a JSON ABI. Accepts a bare array or an artifact object with an
    /// `abi` field. Malformed input yields an empty interface.
    pub fn parse(raw: &str) -> Self {
        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::entries_from_value(&value),
            Err(_) => Vec::new(),
        };
        Self {
            entries,
            raw: raw.to_string(),
        }
    }

    fn entries_from_value(value: &Value) -> Vec<InterfaceEntry> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(object) => match object.get("abi") {
                Some(Value::Array(items)) => items,
                // Some explorers double-encode the ABI inside an artifact
                Some(Value::String(inner)) => {
                    return serde_json::from_str::<Value>(inner)
                        .map(|v| Self::entries_from_value(&v))
                        .unwrap_or_default()
                }
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };
        items.iter().filter_map(InterfaceEntry::from_value).collect()
    }

    pub fn entries(&self) -> &[InterfaceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry with the given name. Overloads share a name; forms address
    /// entries by position instead.
    pub fn find(&self, name: &str) -> Option<&InterfaceEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Raw JSON text this interface was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn parse_params(value: Option<&Value>) -> Option<Vec<AbiParam>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(parse_param).collect(),
        Some(_) => None,
    }
}

fn parse_param(value: &Value) -> Option<AbiParam> {
    let object = value.as_object()?;
    let ty = object.get("type")?.as_str()?.trim().to_string();
    if ty.is_empty() {
        return None;
    }
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let components = if ty.starts_with("tuple") {
        parse_params(object.get("components"))?
    } else {
        Vec::new()
    };
    Some(AbiParam {
        ty,
        name,
        components,
        internal_type: None,
    })
}

fn to_param(param: &AbiParam) -> Param {
    Param {
        name: param.name.clone(),
        ty: param.ty.clone(),
        canonical: param.selector_type().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_FRAGMENT: &str = r#"[
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"event","name":"Transfer","anonymous":false,
         "inputs":[{"name":"from","type":"address","indexed":true}]}
    ]"#;

    #[test]
    fn test_parse_entries_in_order() {
        let interface = Interface::parse(ERC20_FRAGMENT);
        assert_eq!(interface.len(), 3);
        let names: Vec<&str> = interface.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["balanceOf", "transfer", "Transfer"]);
        assert_eq!(interface.entries()[2].kind, EntryKind::Event);
    }

    #[test]
    fn test_selector_and_signature() {
        let interface = Interface::parse(ERC20_FRAGMENT);
        let transfer = interface.find("transfer").unwrap();
        assert_eq!(transfer.signature, "transfer(address,uint256)");
        assert_eq!(transfer.selector_hex(), "0xa9059cbb");
        assert_eq!(transfer.returns_signature(), "(bool)");
    }

    #[test]
    fn test_tuple_components_are_expanded() {
        let raw = r#"[{"type":"function","name":"submit","stateMutability":"nonpayable",
            "inputs":[{"name":"order","type":"tuple[]","components":[
                {"name":"maker","type":"address"},{"name":"amount","type":"uint128"}]}],
            "outputs":[]}]"#;
        let interface = Interface::parse(raw);
        let entry = &interface.entries()[0];
        assert_eq!(entry.inputs[0].ty, "tuple[]");
        assert_eq!(entry.inputs[0].canonical, "(address,uint128)[]");
        assert_eq!(entry.signature, "submit((address,uint128)[])");
    }

    #[test]
    fn test_legacy_mutability_flags() {
        let raw = r#"[
            {"name":"owner","constant":true,"payable":false,"inputs":[],"outputs":[{"name":"","type":"address"}]},
            {"name":"deposit","constant":false,"payable":true,"inputs":[],"outputs":[]},
            {"name":"kill","constant":false,"payable":false,"inputs":[],"outputs":[]}
        ]"#;
        let interface = Interface::parse(raw);
        let kinds: Vec<StateMutability> = interface
            .entries()
            .iter()
            .map(|e| e.state_mutability)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StateMutability::View,
                StateMutability::Payable,
                StateMutability::NonPayable
            ]
        );
    }

    #[test]
    fn test_malformed_input_is_empty() {
        assert!(Interface::parse("not json").is_empty());
        assert!(Interface::parse(r#"{"status":"0"}"#).is_empty());
        assert!(Interface::parse("42").is_empty());
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let raw = r#"[
            "garbage",
            {"type":"function","name":"ok","inputs":[],"outputs":[],"stateMutability":"view"},
            {"type":"function","name":"broken","inputs":[{"name":"x"}]},
            {"type":"mystery","name":"what"}
        ]"#;
        let interface = Interface::parse(raw);
        assert_eq!(interface.len(), 1);
        assert_eq!(interface.entries()[0].name, "ok");
    }

    #[test]
    fn test_artifact_object_with_abi_field() {
        let raw = format!(r#"{{"contractName":"Token","abi":{ERC20_FRAGMENT}}}"#);
        assert_eq!(Interface::parse(&raw).len(), 3);
    }

    #[test]
    fn test_find_returns_first_overload() {
        let raw = r#"[
            {"type":"function","name":"mint","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"}],"outputs":[]},
            {"type":"function","name":"mint","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[]}
        ]"#;
        let interface = Interface::parse(raw);
        assert_eq!(interface.find("mint").unwrap().signature, "mint(address)");
        assert_eq!(interface.entries()[1].signature, "mint(address,uint256)");
    }
}
