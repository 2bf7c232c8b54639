//! ABI domain models
//!
//! Interface descriptions, their read/write partitioning, argument coercion
//! for form input, and return-value decoding.

mod args;
mod formatter;
mod interface;
mod output;

pub use args::{
    coerce_argument, coerce_arguments, encode_call, is_numeric_type, parse_numeric, CoercedArg,
    ValidationError,
};
pub use formatter::{format_interface, Partitions};
pub use interface::{EntryKind, Interface, InterfaceEntry, Param, StateMutability};
pub use output::{decode_outputs, format_sol_value, DecodedOutput};
