//! Shared data model: type indices and specifications, wire ranges,
//! function signatures and calls, plugin bindings, and conversion keys.
//!
//! These types carry no behavior of their own — they are the vocabulary
//! `sieve-interpreter`, `sieve-function`, `sieve-plugin` and
//! `sieve-adapter` share, mirroring how `kirin-ir` defines `Signature`
//! once and lets every dialect crate build on it.

mod binding;
mod call;
mod conversion;
mod signature;
mod ty;
mod value;
mod wire;

pub use binding::{ParameterValue, PluginBinding};
pub use call::FunctionCall;
pub use conversion::ConversionSpec;
pub use signature::{FunctionSignature, ParamSpec};
pub use ty::{TypeIndex, TypeSpec};
pub use value::FieldValue;
pub use wire::{WireIdx, WireRange, WIRE_IDX_MAX};
