/// The common constant/value domain used at the callback boundary
/// (`addc`, `mulc`, `assign`, stream values, moduli, bit-widths).
///
/// The original IR keeps this as an arbitrary-precision `Number_T`
/// supplied by a pluggable number library; adapting such a library is
/// explicitly out of scope here (spec.md §1, "Number-library adapters
/// ... named only by their interface"), so this crate fixes it to
/// `u128`, which comfortably covers the field/ring widths the core
/// itself needs to reason about (moduli, bit-widths, constants).
/// Backends remain free to represent wire *values* however they like
/// via `TypeBackend::Value`; only the callback-level constant
/// representation is fixed.
pub type FieldValue = u128;
