use crate::ty::TypeIndex;

/// The key under which a converter is registered: convert `in_len`
/// wires of `in_type` into `out_len` wires of `out_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversionSpec {
    pub out_type: TypeIndex,
    pub out_len: u64,
    pub in_type: TypeIndex,
    pub in_len: u64,
}

impl ConversionSpec {
    pub fn new(out_type: TypeIndex, out_len: u64, in_type: TypeIndex, in_len: u64) -> Self {
        Self {
            out_type,
            out_len,
            in_type,
            in_len,
        }
    }
}
