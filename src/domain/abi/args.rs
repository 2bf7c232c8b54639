//! Form argument validation, coercion and calldata encoding

use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy_primitives::U256;
use thiserror::Error;

use super::{InterfaceEntry, Param};

/// Client-side validation failures. Nothing is sent when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please input {name}!")]
    MissingField { name: String },
    #[error("{name}: '{value}' is not a number")]
    NotNumeric { name: String, value: String },
    #[error("{name}: {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("{0} cannot be called")]
    NotCallable(String),
}

/// A form value after the coercion rule has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercedArg {
    /// Scalar `uint*` input
    Number(U256),
    /// One-dimensional `uint*[]` / `uint*[N]` input
    Numbers(Vec<U256>),
    /// Everything else, passed through as entered
    Text(String),
}

impl CoercedArg {
    pub fn is_numeric(&self) -> bool {
        matches!(self, CoercedArg::Number(_) | CoercedArg::Numbers(_))
    }
}

/// Types whose name contains "uint" are coerced to numbers before submission.
pub fn is_numeric_type(ty: &str) -> bool {
    ty.contains("uint")
}

/// Parse a decimal or `0x`-prefixed hex number
pub fn parse_numeric(raw: &str) -> Option<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(hex_str) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        U256::from_str_radix(hex_str, 16).ok()
    } else {
        U256::from_str_radix(&trimmed.replace('_', ""), 10).ok()
    }
}

/// Check required fields, then coerce each value.
///
/// All fields are checked for emptiness before any coercion happens so the
/// first missing field is always the one reported.
pub fn coerce_arguments(
    params: &[Param],
    values: &[String],
) -> Result<Vec<CoercedArg>, ValidationError> {
    if params.len() != values.len() {
        return Err(ValidationError::ArgumentCount {
            expected: params.len(),
            got: values.len(),
        });
    }
    if let Some((index, param)) = params
        .iter()
        .enumerate()
        .find(|(index, _)| values[*index].trim().is_empty())
    {
        return Err(ValidationError::MissingField {
            name: param.label(index),
        });
    }
    params
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| coerce_argument(param, index, value))
        .collect()
}

/// Apply the coercion rule to a single value
pub fn coerce_argument(
    param: &Param,
    index: usize,
    raw: &str,
) -> Result<CoercedArg, ValidationError> {
    if !is_numeric_type(&param.ty) {
        return Ok(CoercedArg::Text(raw.to_string()));
    }
    let not_numeric = || ValidationError::NotNumeric {
        name: param.label(index),
        value: raw.to_string(),
    };
    let trimmed = raw.trim();
    match param.ty.matches('[').count() {
        0 => parse_numeric(trimmed).map(CoercedArg::Number).ok_or_else(not_numeric),
        1 => {
            let inner = trimmed
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .ok_or_else(not_numeric)?;
            if inner.trim().is_empty() {
                return Ok(CoercedArg::Numbers(Vec::new()));
            }
            inner
                .split(',')
                .map(|item| parse_numeric(item).ok_or_else(not_numeric))
                .collect::<Result<Vec<_>, _>>()
                .map(CoercedArg::Numbers)
        }
        // Nested arrays keep their text form; the encoder still rejects
        // non-numeric elements.
        _ => Ok(CoercedArg::Text(raw.to_string())),
    }
}

/// Encode a call to `entry` (selector + arguments)
pub fn encode_call(entry: &InterfaceEntry, args: &[CoercedArg]) -> Result<Vec<u8>, ValidationError> {
    let function = entry
        .abi_function()
        .ok_or_else(|| ValidationError::NotCallable(entry.name.clone()))?;
    if args.len() != entry.inputs.len() {
        return Err(ValidationError::ArgumentCount {
            expected: entry.inputs.len(),
            got: args.len(),
        });
    }
    let values = entry
        .inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (param, arg))| to_sol_value(param, index, arg))
        .collect::<Result<Vec<_>, _>>()?;
    function
        .abi_encode_input(&values)
        .map_err(|err| ValidationError::InvalidArgument {
            name: entry.name.clone(),
            reason: err.to_string(),
        })
}

fn to_sol_value(param: &Param, index: usize, arg: &CoercedArg) -> Result<DynSolValue, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidArgument {
        name: param.label(index),
        reason,
    };
    let ty = DynSolType::parse(&param.canonical).map_err(|err| invalid(err.to_string()))?;
    match (arg, &ty) {
        (CoercedArg::Number(value), DynSolType::Uint(bits)) => {
            check_width(*value, *bits).map_err(invalid)?;
            Ok(DynSolValue::Uint(*value, *bits))
        }
        (CoercedArg::Numbers(values), DynSolType::Array(inner))
        | (CoercedArg::Numbers(values), DynSolType::FixedArray(inner, _)) => {
            let DynSolType::Uint(bits) = inner.as_ref() else {
                return Err(invalid(format!("numeric list for {}", param.ty)));
            };
            if let DynSolType::FixedArray(_, len) = &ty {
                if *len != values.len() {
                    return Err(invalid(format!(
                        "expected {len} elements, got {}",
                        values.len()
                    )));
                }
            }
            let items = values
                .iter()
                .map(|value| {
                    check_width(*value, *bits)?;
                    Ok(DynSolValue::Uint(*value, *bits))
                })
                .collect::<Result<Vec<_>, String>>()
                .map_err(invalid)?;
            Ok(match &ty {
                DynSolType::Array(_) => DynSolValue::Array(items),
                _ => DynSolValue::FixedArray(items),
            })
        }
        (CoercedArg::Text(raw), DynSolType::String) => Ok(DynSolValue::String(raw.clone())),
        (CoercedArg::Text(raw), _) => ty
            .coerce_str(raw.trim())
            .map_err(|err| invalid(err.to_string())),
        _ => Err(invalid(format!("value does not fit type {}", param.ty))),
    }
}

fn check_width(value: U256, bits: usize) -> Result<(), String> {
    if bits < 256 && value.bit_len() > bits {
        return Err(format!("{value} overflows uint{bits}"));
    }
    Ok(())
}
